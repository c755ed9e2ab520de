//! Exercise history and past workout listings.
//!
//! History rows come back from the backend as finished exercise instances
//! paired with the slot they were performed for. This module orders them,
//! exports them to CSV, and splits past workouts for the listing screens.

use crate::{Error, ExerciseHistoryEntry, LimitType, PastWorkoutInstance, Result};
use std::cmp::Reverse;
use std::fs::File;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    finished: String,
    exercise: String,
    variants: String,
    limit_type: &'static str,
    limit_value: f64,
    weight_lbs: Option<f64>,
    notes: Option<String>,
}

impl TryFrom<&ExerciseHistoryEntry> for CsvRow {
    type Error = Error;

    fn try_from(entry: &ExerciseHistoryEntry) -> Result<Self> {
        let finished = entry.instance.finished.ok_or_else(|| unfinished(entry))?;
        Ok(CsvRow {
            finished: finished.to_rfc3339(),
            exercise: entry.slot.exercise.name.clone(),
            variants: entry
                .slot
                .variants
                .iter()
                .map(|v| v.name.as_str())
                .collect::<Vec<_>>()
                .join(" - "),
            limit_type: match entry.slot.limit_type {
                LimitType::Reps => "reps",
                LimitType::TimeSeconds => "time_s",
            },
            limit_value: entry.instance.limit_value,
            weight_lbs: entry.instance.weight_lbs,
            notes: entry.instance.description.clone(),
        })
    }
}

fn unfinished(entry: &ExerciseHistoryEntry) -> Error {
    Error::Invariant(format!(
        "History row for exercise instance {} is not finished",
        entry.instance.id
    ))
}

/// Order history rows by `finished`, newest first
///
/// Every row must be finished; the backend only returns finished instances.
pub fn sort_newest_first(entries: &mut [ExerciseHistoryEntry]) -> Result<()> {
    if let Some(entry) = entries.iter().find(|e| e.instance.finished.is_none()) {
        return Err(unfinished(entry));
    }
    entries.sort_by_key(|e| Reverse(e.instance.finished));
    Ok(())
}

/// Write history rows to a CSV file, replacing it, with a header row
///
/// Returns the number of rows written.
pub fn export_csv(entries: &[ExerciseHistoryEntry], csv_path: &Path) -> Result<usize> {
    // Convert first so a bad row never leaves a half-written file behind
    let rows = entries
        .iter()
        .map(CsvRow::try_from)
        .collect::<Result<Vec<_>>>()?;

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(csv_path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(file);
    for row in &rows {
        writer.serialize(row)?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Exported {} history rows to {:?}", rows.len(), csv_path);
    Ok(rows.len())
}

/// Past workouts as the listing shows them
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PastInstances {
    /// Started but not finished, most recently started first
    pub incomplete: Vec<PastWorkoutInstance>,
    /// Everything, most recently created first
    pub all: Vec<PastWorkoutInstance>,
}

pub fn split_past_instances(instances: Vec<PastWorkoutInstance>) -> PastInstances {
    let mut incomplete: Vec<_> = instances
        .iter()
        .filter(|w| w.started.is_some() && w.finished.is_none())
        .cloned()
        .collect();
    incomplete.sort_by_key(|w| Reverse(w.started));

    let mut all = instances;
    all.sort_by_key(|w| Reverse(w.created));

    PastInstances { incomplete, all }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::fixtures::*;
    use uuid::Uuid;

    fn entry(finished: Option<i64>, weight: Option<f64>) -> ExerciseHistoryEntry {
        let s = slot(&exercise("barbell bench press"), LimitType::Reps, 5.0);
        let mut instance = exercise_instance(&s, 1);
        instance.finished = finished.map(at);
        instance.weight_lbs = weight;
        ExerciseHistoryEntry { slot: s, instance }
    }

    fn past(created: i64, started: Option<i64>, finished: Option<i64>) -> PastWorkoutInstance {
        PastWorkoutInstance {
            id: Uuid::new_v4(),
            created: at(created),
            description: None,
            started: started.map(at),
            finished: finished.map(at),
            definition_name: "test workout".into(),
            definition_description: None,
        }
    }

    #[test]
    fn test_sort_newest_first() {
        let mut entries = vec![
            entry(Some(10), None),
            entry(Some(30), None),
            entry(Some(20), None),
        ];
        sort_newest_first(&mut entries).unwrap();

        let order: Vec<_> = entries.iter().map(|e| e.instance.finished).collect();
        assert_eq!(order, vec![Some(at(30)), Some(at(20)), Some(at(10))]);
    }

    #[test]
    fn test_unfinished_row_is_fatal() {
        let mut entries = vec![entry(Some(10), None), entry(None, None)];
        let err = sort_newest_first(&mut entries).unwrap_err();
        assert!(matches!(err, Error::Invariant(_)));
    }

    #[test]
    fn test_export_csv_writes_header_and_rows() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("out").join("history.csv");
        let mut with_variant = entry(Some(20), Some(135.0));
        with_variant.slot.variants.push(variant("5 second tempo"));
        with_variant.instance.description = Some("grindy".into());

        let count = export_csv(&[with_variant, entry(Some(10), None)], &csv_path).unwrap();
        assert_eq!(count, 2);

        let contents = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(
            lines[0],
            "finished,exercise,variants,limit_type,limit_value,weight_lbs,notes"
        );
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("barbell bench press,5 second tempo,reps,5.0,135.0,grindy"));
        assert!(lines[2].ends_with("barbell bench press,,reps,5.0,,"));
    }

    #[test]
    fn test_export_csv_replaces_existing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("history.csv");
        std::fs::write(&csv_path, "stale\n").unwrap();

        export_csv(&[entry(Some(10), None)], &csv_path).unwrap();

        let contents = std::fs::read_to_string(&csv_path).unwrap();
        assert!(!contents.contains("stale"));
        assert_eq!(contents.lines().count(), 2);
    }

    #[test]
    fn test_export_csv_rejects_unfinished_without_writing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("history.csv");

        let err = export_csv(&[entry(None, None)], &csv_path).unwrap_err();
        assert!(matches!(err, Error::Invariant(_)));
        assert!(!csv_path.exists());
    }

    #[test]
    fn test_split_past_instances() {
        let done = past(0, Some(10), Some(100));
        let old_open = past(200, Some(210), None);
        let new_open = past(100, Some(300), None);
        let untouched = past(400, None, None);

        let split = split_past_instances(vec![
            done.clone(),
            old_open.clone(),
            new_open.clone(),
            untouched.clone(),
        ]);

        assert_eq!(split.incomplete, vec![new_open.clone(), old_open.clone()]);
        assert_eq!(split.all, vec![untouched, old_open, new_open, done]);
    }
}

//! File-backed workout store.
//!
//! [`StoreData`] is the whole store as one JSON document and implements
//! [`WorkoutBackend`] in memory. [`FileStore`] wraps it on disk: every
//! backend call is one locked load → mutate → atomic save cycle.

use crate::backend::{ExerciseInstancePatch, WorkoutBackend, WorkoutInstancePatch};
use crate::catalog::Catalog;
use crate::{
    Error, ExerciseHistoryEntry, ExerciseInstance, PastWorkoutInstance, Result, WorkoutCycle,
    WorkoutDefinition, WorkoutInstance,
};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

/// A cycle as stored: definitions by id, in order
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CycleRecord {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub definition_ids: Vec<Uuid>,
}

/// Entire store contents
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StoreData {
    #[serde(default)]
    pub definitions: Vec<WorkoutDefinition>,
    #[serde(default)]
    pub cycles: Vec<CycleRecord>,
    #[serde(default)]
    pub instances: Vec<WorkoutInstance>,
}

impl StoreData {
    /// Merge a catalog in, skipping ids already present. Returns how many
    /// definitions were added.
    pub fn import_catalog(&mut self, catalog: &Catalog) -> Result<usize> {
        let mut added = 0;
        for definition in &catalog.definitions {
            if self.definitions.iter().any(|d| d.id == definition.id) {
                continue;
            }
            let errors = definition.validate();
            if !errors.is_empty() {
                return Err(Error::Validation(errors.join("; ")));
            }
            self.definitions.push(definition.clone());
            added += 1;
        }
        for cycle in &catalog.cycles {
            if !self.cycles.iter().any(|c| c.id == cycle.id) {
                self.cycles.push(cycle.clone());
            }
        }
        Ok(added)
    }

    /// Structural checks run after every load
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = self
            .definitions
            .iter()
            .flat_map(WorkoutDefinition::validate)
            .collect();
        for instance in &self.instances {
            let mut seen = HashSet::new();
            for e in &instance.exercise_instances {
                if e.set_iteration == 0 {
                    errors.push(format!("Exercise instance {} has set iteration 0", e.id));
                }
                if !seen.insert((e.slot_id, e.set_iteration)) {
                    errors.push(format!(
                        "Workout instance {} has two exercise instances for slot {} set {}",
                        instance.id, e.slot_id, e.set_iteration
                    ));
                }
            }
        }
        for cycle in &self.cycles {
            for id in &cycle.definition_ids {
                if !self.definitions.iter().any(|d| d.id == *id) {
                    errors.push(format!("Cycle '{}' references unknown definition {}", cycle.name, id));
                }
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(errors.join("; ")))
        }
    }

    fn definition(&self, id: Uuid) -> Result<&WorkoutDefinition> {
        self.definitions
            .iter()
            .find(|d| d.id == id)
            .ok_or_else(|| Error::NotFound(format!("workout definition {}", id)))
    }

    fn instance(&self, id: Uuid) -> Result<&WorkoutInstance> {
        self.instances
            .iter()
            .find(|w| w.id == id)
            .ok_or_else(|| Error::NotFound(format!("workout instance {}", id)))
    }

    fn instance_mut(&mut self, id: Uuid) -> Result<&mut WorkoutInstance> {
        self.instances
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or_else(|| Error::NotFound(format!("workout instance {}", id)))
    }

    /// The workout instance holding an exercise instance, and that exercise instance
    pub fn workout_with_exercise(
        &self,
        exercise_instance_id: Uuid,
    ) -> Result<(&WorkoutInstance, &ExerciseInstance)> {
        self.instances
            .iter()
            .find_map(|w| w.exercise_instance(exercise_instance_id).map(|e| (w, e)))
            .ok_or_else(|| Error::NotFound(format!("exercise instance {}", exercise_instance_id)))
    }

    /// Latest `finished` among instances of a definition
    fn last_finished(&self, definition_id: Uuid) -> Option<DateTime<Utc>> {
        self.instances
            .iter()
            .filter(|w| w.definition.id == definition_id)
            .filter_map(|w| w.finished)
            .max()
    }

    fn with_last_finished(&self, definition: &WorkoutDefinition) -> WorkoutDefinition {
        WorkoutDefinition {
            last_finished: self.last_finished(definition.id),
            ..definition.clone()
        }
    }
}

fn check_quantity(name: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) if v.is_nan() || v < 0.0 => Err(Error::Validation(format!(
            "{} must be a non-negative number, got {}",
            name, v
        ))),
        _ => Ok(()),
    }
}

impl WorkoutBackend for StoreData {
    fn instantiate_workout(&mut self, definition_id: Uuid) -> Result<WorkoutInstance> {
        let definition = self.with_last_finished(self.definition(definition_id)?);

        let mut exercise_instances = Vec::new();
        for block in &definition.blocks {
            for set_iteration in 1..=block.sets_count {
                for slot in &block.exercises {
                    exercise_instances.push(ExerciseInstance {
                        id: Uuid::new_v4(),
                        slot_id: slot.id,
                        set_iteration,
                        weight_lbs: None,
                        limit_value: slot.limit_value,
                        description: None,
                        started: None,
                        finished: None,
                        paused_time_seconds: None,
                    });
                }
            }
        }

        let instance = WorkoutInstance {
            id: Uuid::new_v4(),
            created: Utc::now(),
            definition,
            description: None,
            started: None,
            finished: None,
            exercise_instances,
        };
        tracing::info!(
            "Instantiated '{}' as {} with {} exercise instances",
            instance.definition.name,
            instance.id,
            instance.exercise_instances.len()
        );
        self.instances.push(instance.clone());
        Ok(instance)
    }

    fn get_workout_instance(&self, id: Uuid) -> Result<WorkoutInstance> {
        self.instance(id).cloned()
    }

    fn patch_workout_instance(
        &mut self,
        id: Uuid,
        patch: &WorkoutInstancePatch,
    ) -> Result<WorkoutInstance> {
        let instance = self.instance_mut(id)?;
        if let Some(description) = &patch.description {
            instance.description = Some(description.clone());
        }
        if let Some(started) = patch.started {
            instance.started = Some(started);
        }
        if patch.clear_finished {
            instance.finished = None;
        }
        if let Some(finished) = patch.finished {
            instance.finished = Some(finished);
        }
        tracing::debug!("Patched workout instance {}", id);
        Ok(instance.clone())
    }

    fn patch_exercise_instance(
        &mut self,
        id: Uuid,
        patch: &ExerciseInstancePatch,
    ) -> Result<WorkoutInstance> {
        check_quantity("weight_lbs", patch.weight_lbs)?;
        check_quantity("limit_value", patch.limit_value)?;
        check_quantity("paused_time_seconds", patch.paused_time_seconds)?;

        let workout = self
            .instances
            .iter_mut()
            .find(|w| w.exercise_instances.iter().any(|e| e.id == id))
            .ok_or_else(|| Error::NotFound(format!("exercise instance {}", id)))?;
        let Some(exercise) = workout.exercise_instances.iter_mut().find(|e| e.id == id) else {
            return Err(Error::NotFound(format!("exercise instance {}", id)));
        };

        if let Some(weight) = patch.weight_lbs {
            exercise.weight_lbs = Some(weight);
        }
        if let Some(limit) = patch.limit_value {
            exercise.limit_value = limit;
        }
        if let Some(description) = &patch.description {
            exercise.description = Some(description.clone());
        }
        if let Some(started) = patch.started {
            exercise.started = Some(started);
        }
        if let Some(finished) = patch.finished {
            exercise.finished = Some(finished);
        }
        if let Some(paused) = patch.paused_time_seconds {
            exercise.paused_time_seconds = Some(paused);
        }
        tracing::debug!("Patched exercise instance {}", id);
        Ok(workout.clone())
    }

    fn list_workout_definitions(&self) -> Result<Vec<WorkoutDefinition>> {
        Ok(self
            .definitions
            .iter()
            .map(|d| self.with_last_finished(d))
            .collect())
    }

    fn list_workout_cycles(&self) -> Result<Vec<WorkoutCycle>> {
        self.cycles
            .iter()
            .map(|cycle| {
                let entries = cycle
                    .definition_ids
                    .iter()
                    .map(|id| self.definition(*id).map(|d| self.with_last_finished(d)))
                    .collect::<Result<Vec<_>>>()?;
                Ok(WorkoutCycle {
                    id: cycle.id,
                    name: cycle.name.clone(),
                    description: cycle.description.clone(),
                    entries,
                })
            })
            .collect()
    }

    fn list_workout_instances(&self) -> Result<Vec<PastWorkoutInstance>> {
        Ok(self.instances.iter().map(PastWorkoutInstance::from).collect())
    }

    fn get_exercise_history(
        &self,
        exercise_instance_id: Uuid,
    ) -> Result<Vec<ExerciseHistoryEntry>> {
        let (workout, exercise) = self.workout_with_exercise(exercise_instance_id)?;
        let (_, slot) = workout.definition.find_slot(exercise.slot_id).ok_or_else(|| {
            Error::Invariant(format!(
                "Exercise instance {} references slot {} missing from workout {}",
                exercise.id, exercise.slot_id, workout.id
            ))
        })?;
        let exercise_id = slot.exercise.id;
        let identity = slot.variant_identity();

        let mut entries = Vec::new();
        for w in &self.instances {
            for e in w.exercise_instances.iter().filter(|e| e.finished.is_some()) {
                if let Some((_, s)) = w.definition.find_slot(e.slot_id) {
                    if s.exercise.id == exercise_id && s.variant_identity() == identity {
                        entries.push(ExerciseHistoryEntry {
                            slot: s.clone(),
                            instance: e.clone(),
                        });
                    }
                }
            }
        }
        crate::history::sort_newest_first(&mut entries)?;
        Ok(entries)
    }
}

// ============================================================================
// On-disk store
// ============================================================================

/// JSON document store with file locking
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    /// Load the store, or an empty one if the file doesn't exist yet
    ///
    /// A file that exists but doesn't parse or validate is an error: saving
    /// over it would lose the user's data.
    pub fn load(&self) -> Result<StoreData> {
        if !self.path.exists() {
            tracing::debug!("No store at {:?}, starting empty", self.path);
            return Ok(StoreData::default());
        }

        let file = File::open(&self.path)?;
        // Acquire shared lock for reading
        file.lock_shared()?;
        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        let data: StoreData = serde_json::from_str(&contents)?;
        data.validate()?;
        tracing::debug!(
            "Loaded store from {:?}: {} definitions, {} instances",
            self.path,
            data.definitions.len(),
            data.instances.len()
        );
        Ok(data)
    }

    /// Atomically replace the store file
    pub fn save(&self, data: &StoreData) -> Result<()> {
        let parent = self.path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "store path missing parent")
        })?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(data)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved store to {:?}", self.path);
        Ok(())
    }

    /// Load, modify and save under an exclusive lock
    pub fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut StoreData) -> Result<T>,
    {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())?;
        lock.lock_exclusive()?;

        let result = self.load().and_then(|mut data| {
            let value = f(&mut data)?;
            self.save(&data)?;
            Ok(value)
        });

        lock.unlock()?;
        result
    }
}

impl WorkoutBackend for FileStore {
    fn instantiate_workout(&mut self, definition_id: Uuid) -> Result<WorkoutInstance> {
        self.update(|data| data.instantiate_workout(definition_id))
    }

    fn get_workout_instance(&self, id: Uuid) -> Result<WorkoutInstance> {
        self.load()?.get_workout_instance(id)
    }

    fn patch_workout_instance(
        &mut self,
        id: Uuid,
        patch: &WorkoutInstancePatch,
    ) -> Result<WorkoutInstance> {
        self.update(|data| data.patch_workout_instance(id, patch))
    }

    fn patch_exercise_instance(
        &mut self,
        id: Uuid,
        patch: &ExerciseInstancePatch,
    ) -> Result<WorkoutInstance> {
        self.update(|data| data.patch_exercise_instance(id, patch))
    }

    fn list_workout_definitions(&self) -> Result<Vec<WorkoutDefinition>> {
        self.load()?.list_workout_definitions()
    }

    fn list_workout_cycles(&self) -> Result<Vec<WorkoutCycle>> {
        self.load()?.list_workout_cycles()
    }

    fn list_workout_instances(&self) -> Result<Vec<PastWorkoutInstance>> {
        self.load()?.list_workout_instances()
    }

    fn get_exercise_history(
        &self,
        exercise_instance_id: Uuid,
    ) -> Result<Vec<ExerciseHistoryEntry>> {
        self.load()?.get_exercise_history(exercise_instance_id)
    }
}

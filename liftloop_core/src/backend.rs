//! Backend collaborator interface.
//!
//! The backend owns storage. Every call is atomic on its own and returns
//! validated records; the playthrough code never edits a workout in memory
//! and instead re-sequences whatever the backend hands back.

use crate::playthrough::ExerciseCompletion;
use crate::{
    ExerciseHistoryEntry, PastWorkoutInstance, Result, WorkoutCycle, WorkoutDefinition,
    WorkoutInstance,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fields to change on a workout instance; `None` leaves a field alone
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkoutInstancePatch {
    pub description: Option<String>,
    pub started: Option<DateTime<Utc>>,
    pub finished: Option<DateTime<Utc>>,
    /// Restart: drop `finished` (applied before `finished`)
    #[serde(default)]
    pub clear_finished: bool,
}

/// Fields to change on an exercise instance; `None` leaves a field alone
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ExerciseInstancePatch {
    pub weight_lbs: Option<f64>,
    pub limit_value: Option<f64>,
    pub description: Option<String>,
    pub started: Option<DateTime<Utc>>,
    pub finished: Option<DateTime<Utc>>,
    pub paused_time_seconds: Option<f64>,
}

impl From<&ExerciseCompletion> for ExerciseInstancePatch {
    fn from(completion: &ExerciseCompletion) -> Self {
        ExerciseInstancePatch {
            started: Some(completion.started),
            finished: Some(completion.finished),
            paused_time_seconds: Some(completion.paused_time_seconds),
            ..Default::default()
        }
    }
}

/// Which editable quantity of an exercise instance is being set
#[derive(Clone, Debug, PartialEq)]
pub enum QuantityEdit {
    WeightLbs(f64),
    LimitValue(f64),
    Notes(String),
}

impl QuantityEdit {
    pub fn name(&self) -> &'static str {
        match self {
            QuantityEdit::WeightLbs(_) => "weight (lbs)",
            QuantityEdit::LimitValue(_) => "limit",
            QuantityEdit::Notes(_) => "notes",
        }
    }

    pub fn to_patch(&self) -> ExerciseInstancePatch {
        match self {
            QuantityEdit::WeightLbs(w) => ExerciseInstancePatch {
                weight_lbs: Some(*w),
                ..Default::default()
            },
            QuantityEdit::LimitValue(v) => ExerciseInstancePatch {
                limit_value: Some(*v),
                ..Default::default()
            },
            QuantityEdit::Notes(text) => ExerciseInstancePatch {
                description: Some(text.clone()),
                ..Default::default()
            },
        }
    }
}

/// Remote operations the playthrough and the frontend rely on
pub trait WorkoutBackend {
    /// Create an instance of a definition with every exercise instance materialized
    fn instantiate_workout(&mut self, definition_id: Uuid) -> Result<WorkoutInstance>;

    fn get_workout_instance(&self, id: Uuid) -> Result<WorkoutInstance>;

    fn patch_workout_instance(
        &mut self,
        id: Uuid,
        patch: &WorkoutInstancePatch,
    ) -> Result<WorkoutInstance>;

    /// Patch one exercise instance, returning its refreshed parent workout
    fn patch_exercise_instance(
        &mut self,
        id: Uuid,
        patch: &ExerciseInstancePatch,
    ) -> Result<WorkoutInstance>;

    fn list_workout_definitions(&self) -> Result<Vec<WorkoutDefinition>>;

    fn list_workout_cycles(&self) -> Result<Vec<WorkoutCycle>>;

    fn list_workout_instances(&self) -> Result<Vec<PastWorkoutInstance>>;

    /// Finished performances of the same exercise and variants as an instance
    fn get_exercise_history(&self, exercise_instance_id: Uuid)
        -> Result<Vec<ExerciseHistoryEntry>>;
}

/// Audible cue played on every phase advance
///
/// Cues are fire-and-forget: a failing cue is logged and otherwise ignored.
pub trait Cue {
    fn play(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::fixtures::at;

    #[test]
    fn test_completion_becomes_timing_patch() {
        let completion = ExerciseCompletion {
            exercise_instance_id: Uuid::new_v4(),
            started: at(0),
            finished: at(40),
            paused_time_seconds: 5.5,
        };

        let patch = ExerciseInstancePatch::from(&completion);
        assert_eq!(patch.started, Some(at(0)));
        assert_eq!(patch.finished, Some(at(40)));
        assert_eq!(patch.paused_time_seconds, Some(5.5));
        assert_eq!(patch.weight_lbs, None);
        assert_eq!(patch.limit_value, None);
    }

    #[test]
    fn test_quantity_edit_patches_one_field() {
        let patch = QuantityEdit::WeightLbs(135.0).to_patch();
        assert_eq!(
            patch,
            ExerciseInstancePatch {
                weight_lbs: Some(135.0),
                ..Default::default()
            }
        );

        let patch = QuantityEdit::Notes("felt easy".into()).to_patch();
        assert_eq!(patch.description.as_deref(), Some("felt easy"));
        assert_eq!(patch.weight_lbs, None);
    }
}

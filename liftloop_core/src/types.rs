//! Core domain types for liftloop.
//!
//! This module defines the records exchanged with the backend:
//! - Exercises and variants
//! - Workout definitions (blocks of exercise slots)
//! - Workout instances and their exercise instances
//! - Workout cycles and history rows

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Exercise Catalog Types
// ============================================================================

/// An exercise (e.g., "barbell bench press")
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

/// A named qualifier on a slot (e.g., "left side", "5 second tempo")
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Variant {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

// ============================================================================
// Workout Definition Types
// ============================================================================

/// How a slot is limited
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LimitType {
    Reps,
    #[serde(rename = "time_s")]
    TimeSeconds,
}

/// A single exercise position within a block
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseSlot {
    pub id: Uuid,
    pub description: Option<String>,
    pub exercise: Exercise,
    #[serde(default)]
    pub variants: Vec<Variant>,
    pub limit_type: LimitType,
    pub limit_value: f64,
}

impl ExerciseSlot {
    /// Exercise name followed by variant names, joined by " - "
    pub fn title(&self) -> String {
        std::iter::once(self.exercise.name.as_str())
            .chain(self.variants.iter().map(|v| v.name.as_str()))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" - ")
    }

    /// Variant ids sorted, so two slots carrying the same variants compare equal
    /// regardless of the order they were attached in.
    pub fn variant_identity(&self) -> Vec<Uuid> {
        let mut ids: Vec<_> = self.variants.iter().map(|v| v.id).collect();
        ids.sort();
        ids
    }
}

/// An ordered group of slots repeated `sets_count` times
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Block {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub sets_count: u32,
    pub transition_time_seconds: Option<f64>,
    pub exercises: Vec<ExerciseSlot>,
}

/// A reusable workout definition
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutDefinition {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub blocks: Vec<Block>,
    /// Latest `finished` among instances of this definition (filled by the backend)
    #[serde(default)]
    pub last_finished: Option<DateTime<Utc>>,
}

impl WorkoutDefinition {
    /// Find a slot and the index of its block
    pub fn find_slot(&self, slot_id: Uuid) -> Option<(usize, &ExerciseSlot)> {
        self.blocks.iter().enumerate().find_map(|(block_idx, block)| {
            block
                .exercises
                .iter()
                .find(|slot| slot.id == slot_id)
                .map(|slot| (block_idx, slot))
        })
    }

    /// Validate structural rules the sequencer relies on
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for (idx, block) in self.blocks.iter().enumerate() {
            if block.sets_count == 0 {
                errors.push(format!(
                    "Block {} of '{}' has sets_count 0",
                    idx + 1,
                    self.name
                ));
            }
            if block.transition_time_seconds.is_some_and(|t| t < 0.0) {
                errors.push(format!(
                    "Block {} of '{}' has a negative transition time",
                    idx + 1,
                    self.name
                ));
            }
            for slot in &block.exercises {
                if slot.limit_value < 0.0 {
                    errors.push(format!(
                        "Slot '{}' in block {} has a negative limit",
                        slot.title(),
                        idx + 1
                    ));
                }
            }
        }
        errors
    }
}

// ============================================================================
// Workout Instance Types
// ============================================================================

/// Per-performance record of one (slot, set iteration) pairing
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseInstance {
    pub id: Uuid,
    pub slot_id: Uuid,
    pub set_iteration: u32,
    pub weight_lbs: Option<f64>,
    pub limit_value: f64,
    pub description: Option<String>,
    pub started: Option<DateTime<Utc>>,
    pub finished: Option<DateTime<Utc>>,
    pub paused_time_seconds: Option<f64>,
}

/// A started/instantiated copy of a workout definition
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutInstance {
    pub id: Uuid,
    pub created: DateTime<Utc>,
    pub definition: WorkoutDefinition,
    pub description: Option<String>,
    pub started: Option<DateTime<Utc>>,
    pub finished: Option<DateTime<Utc>>,
    pub exercise_instances: Vec<ExerciseInstance>,
}

impl WorkoutInstance {
    pub fn exercise_instance(&self, id: Uuid) -> Option<&ExerciseInstance> {
        self.exercise_instances.iter().find(|e| e.id == id)
    }

    pub fn is_in_progress(&self) -> bool {
        self.started.is_some() && self.finished.is_none()
    }
}

/// Instance header used by the past-workouts listing
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PastWorkoutInstance {
    pub id: Uuid,
    pub created: DateTime<Utc>,
    pub description: Option<String>,
    pub started: Option<DateTime<Utc>>,
    pub finished: Option<DateTime<Utc>>,
    pub definition_name: String,
    pub definition_description: Option<String>,
}

impl From<&WorkoutInstance> for PastWorkoutInstance {
    fn from(instance: &WorkoutInstance) -> Self {
        PastWorkoutInstance {
            id: instance.id,
            created: instance.created,
            description: instance.description.clone(),
            started: instance.started,
            finished: instance.finished,
            definition_name: instance.definition.name.clone(),
            definition_description: instance.definition.description.clone(),
        }
    }
}

// ============================================================================
// Cycle and History Types
// ============================================================================

/// A rotating list of workout definitions
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutCycle {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub entries: Vec<WorkoutDefinition>,
}

/// One finished performance of an exercise, with the slot it was performed for
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseHistoryEntry {
    pub slot: ExerciseSlot,
    pub instance: ExerciseInstance,
}

//! Variant pairing for quantity edits.
//!
//! A bilateral exercise is defined as two slots in the same block, one
//! tagged "left side" and the other "right side". An edit on one side is
//! carried to the other side and forward to the not-yet-done sets of both.

use crate::backend::{QuantityEdit, WorkoutBackend};
use crate::{Error, ExerciseInstance, Result, WorkoutInstance};
use std::collections::HashSet;
use uuid::Uuid;

/// Variant names that only say which side of the body is worked
pub const SIDE_VARIANTS: [&str; 2] = ["left side", "right side"];

fn is_side_variant(name: &str) -> bool {
    SIDE_VARIANTS
        .iter()
        .any(|side| side.eq_ignore_ascii_case(name.trim()))
}

/// Variant ids of a slot with the side tags removed, sorted
fn identity_without_sides(slot: &crate::ExerciseSlot) -> Vec<Uuid> {
    let mut ids: Vec<_> = slot
        .variants
        .iter()
        .filter(|v| !is_side_variant(&v.name))
        .map(|v| v.id)
        .collect();
    ids.sort();
    ids
}

/// Slots that share an edit with the slot of `target`
///
/// Related means: same block, same exercise, same variants once left/right
/// tags are ignored. The target's own slot is always included.
pub fn related_slot_ids(
    workout: &WorkoutInstance,
    target: &ExerciseInstance,
) -> Result<HashSet<Uuid>> {
    let (block_idx, target_slot) = workout.definition.find_slot(target.slot_id).ok_or_else(|| {
        Error::Invariant(format!(
            "Exercise instance {} references slot {} missing from workout {}",
            target.id, target.slot_id, workout.id
        ))
    })?;
    let target_identity = identity_without_sides(target_slot);

    let mut related: HashSet<Uuid> = workout.definition.blocks[block_idx]
        .exercises
        .iter()
        .filter(|slot| {
            slot.exercise.id == target_slot.exercise.id
                && identity_without_sides(slot) == target_identity
        })
        .map(|slot| slot.id)
        .collect();
    related.insert(target_slot.id);
    Ok(related)
}

/// Exercise instances an edit on `target` should be written to
///
/// A finished target only patches itself. An unfinished target patches every
/// unfinished instance of a related slot at the same or a later set.
pub fn instances_to_patch(
    workout: &WorkoutInstance,
    target: &ExerciseInstance,
) -> Result<HashSet<Uuid>> {
    if target.finished.is_some() {
        return Ok(HashSet::from([target.id]));
    }

    let related = related_slot_ids(workout, target)?;
    let ids: HashSet<Uuid> = workout
        .exercise_instances
        .iter()
        .filter(|e| {
            e.finished.is_none()
                && related.contains(&e.slot_id)
                && e.set_iteration >= target.set_iteration
        })
        .map(|e| e.id)
        .collect();

    tracing::debug!(
        "Edit on {} fans out to {} exercise instances",
        target.id,
        ids.len()
    );
    Ok(ids)
}

/// Write an edit to `target` and every instance it fans out to
///
/// Patches go out in id order; the workout from the last response is
/// returned.
pub fn apply_quantity_edit<B: WorkoutBackend>(
    backend: &mut B,
    workout: &WorkoutInstance,
    target: &ExerciseInstance,
    edit: &QuantityEdit,
) -> Result<WorkoutInstance> {
    let mut ids: Vec<Uuid> = instances_to_patch(workout, target)?.into_iter().collect();
    ids.sort();

    let patch = edit.to_patch();
    let mut refreshed = workout.clone();
    for id in &ids {
        refreshed = backend.patch_exercise_instance(*id, &patch)?;
    }
    tracing::info!("Set {} on {} exercise instances", edit.name(), ids.len());
    Ok(refreshed)
}

//! Entry sequencing.
//!
//! Expands a workout definition into (block × set iteration × slot) in
//! definition order and pairs each expansion point with the exercise
//! instance recorded for it. The result is the linear list of exercises a
//! playthrough walks through.

use crate::{Block, ExerciseInstance, ExerciseSlot, WorkoutInstance};
use std::collections::HashMap;
use uuid::Uuid;

/// An expansion point matched to its exercise instance
#[derive(Clone, Debug, PartialEq)]
pub struct SequencedEntry {
    pub instance: ExerciseInstance,
    pub block_index: usize,
    pub slot_index: usize,
}

impl SequencedEntry {
    pub fn block<'a>(&self, workout: &'a WorkoutInstance) -> Option<&'a Block> {
        workout.definition.blocks.get(self.block_index)
    }

    pub fn slot<'a>(&self, workout: &'a WorkoutInstance) -> Option<&'a ExerciseSlot> {
        self.block(workout)
            .and_then(|block| block.exercises.get(self.slot_index))
    }

    fn sort_key(&self) -> (usize, u32, usize) {
        (self.block_index, self.instance.set_iteration, self.slot_index)
    }
}

/// Sequencer output
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SortedEntries {
    pub entries: Vec<SequencedEntry>,
    pub id_to_index: HashMap<Uuid, usize>,
}

impl SortedEntries {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SequencedEntry> {
        self.entries.get(index)
    }

    /// Position of an exercise instance in the sequence
    pub fn index_of(&self, instance_id: Uuid) -> Option<usize> {
        self.id_to_index.get(&instance_id).copied()
    }
}

/// Build the ordered entry list for a workout instance
///
/// Expansion points without a matching instance are skipped, as are
/// instances that match no expansion point.
pub fn sequence(workout: &WorkoutInstance) -> SortedEntries {
    let by_key: HashMap<(Uuid, u32), &ExerciseInstance> = workout
        .exercise_instances
        .iter()
        .map(|e| ((e.slot_id, e.set_iteration), e))
        .collect();

    let mut entries = Vec::with_capacity(workout.exercise_instances.len());
    for (block_index, block) in workout.definition.blocks.iter().enumerate() {
        for set_iteration in 1..=block.sets_count {
            for (slot_index, slot) in block.exercises.iter().enumerate() {
                if let Some(instance) = by_key.get(&(slot.id, set_iteration)) {
                    entries.push(SequencedEntry {
                        instance: (*instance).clone(),
                        block_index,
                        slot_index,
                    });
                }
            }
        }
    }

    // Traversal order already is the sort order; the stable sort pins it.
    entries.sort_by_key(SequencedEntry::sort_key);

    let id_to_index = entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| (entry.instance.id, idx))
        .collect();

    tracing::debug!(
        "Sequenced {} of {} exercise instances for workout {}",
        entries.len(),
        workout.exercise_instances.len(),
        workout.id
    );

    SortedEntries {
        entries,
        id_to_index,
    }
}

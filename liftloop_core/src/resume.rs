//! Where to pick a workout (or a cycle) back up.
//!
//! Both resolvers follow the same rule: find the most recently finished item
//! and continue with the one after it, wrapping to the start after the last.
//! Wrapping means a fully finished workout resumes at its first exercise,
//! which is how a completed workout gets redone.

use crate::sequence::SequencedEntry;
use chrono::{DateTime, Utc};

/// Index of the latest timestamp; ties go to whichever `max_by_key` keeps
fn latest_index<I>(finished: I) -> Option<usize>
where
    I: IntoIterator<Item = Option<DateTime<Utc>>>,
{
    finished
        .into_iter()
        .enumerate()
        .filter_map(|(idx, ts)| ts.map(|ts| (idx, ts)))
        .max_by_key(|(_, ts)| *ts)
        .map(|(idx, _)| idx)
}

/// Sequence position a playthrough should resume at
///
/// 0 when nothing is finished (or the sequence is empty), otherwise the entry
/// after the latest finished one, modulo the sequence length.
pub fn next_position(entries: &[SequencedEntry]) -> usize {
    match latest_index(entries.iter().map(|e| e.instance.finished)) {
        None => 0,
        Some(idx) => (idx + 1) % entries.len(),
    }
}

/// Cycle entry to suggest next, given each entry's last finished time
///
/// `None` for an empty cycle.
pub fn next_cycle_entry(last_finished: &[Option<DateTime<Utc>>]) -> Option<usize> {
    if last_finished.is_empty() {
        return None;
    }
    Some(match latest_index(last_finished.iter().copied()) {
        None => 0,
        Some(idx) => (idx + 1) % last_finished.len(),
    })
}

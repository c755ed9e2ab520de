//! Playthrough state machine.
//!
//! Each sequenced entry is played in two phases: a get-ready `Transition`
//! countdown and the `Play` phase proper. The reducer [`reduce`] takes the
//! current [`PlaythroughState`] and an [`Action`] and returns the next state
//! plus whatever has to be persisted; it performs no I/O itself.
//!
//! Rest slots (the configured recover exercise) start directly in `Play`.

use crate::config::PlaythroughSettings;
use crate::sequence::{SequencedEntry, SortedEntries};
use crate::timer::{TimerEventKind, TimerLog};
use crate::{
    Block, Error, ExerciseInstance, ExerciseSlot, LimitType, Result, WorkoutInstance,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Transition,
    Play,
}

/// Where a playthrough currently is
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlaythroughState {
    pub workout: WorkoutInstance,
    pub exercise_instance_id: Uuid,
    pub phase: Phase,
    pub timer: TimerLog,
}

/// Commands a frontend binds to buttons and its ticker
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Advance,
    Pause,
    Resume,
    ToggleTimer,
    /// Periodic recompute; advances once the countdown reaches zero
    Tick,
}

/// Timing of a finished play phase, ready to be written to the backend
#[derive(Clone, Debug, PartialEq)]
pub struct ExerciseCompletion {
    pub exercise_instance_id: Uuid,
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
    pub paused_time_seconds: f64,
}

/// Result of applying an [`Action`]
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// Same entry and phase; timer log may have grown
    Unchanged(PlaythroughState),
    /// Transition finished, the exercise itself starts
    PlayStarted(PlaythroughState),
    /// Exercise finished and the next entry starts
    ExerciseFinished {
        completion: ExerciseCompletion,
        next: PlaythroughState,
    },
    /// Last entry finished; the workout is done
    WorkoutFinished {
        completion: ExerciseCompletion,
        workout: WorkoutInstance,
    },
}

impl Outcome {
    /// True when a new entry or phase began (timers must be restarted)
    pub fn changes_phase(&self) -> bool {
        !matches!(self, Outcome::Unchanged(_))
    }
}

/// Initial state for an entry: `Transition` unless the slot is a rest slot
pub fn initial_state(
    workout: WorkoutInstance,
    entry: &SequencedEntry,
    settings: &PlaythroughSettings,
    now: DateTime<Utc>,
) -> Result<PlaythroughState> {
    let slot = entry.slot(&workout).ok_or_else(|| {
        Error::Invariant(format!(
            "Entry for exercise instance {} points outside workout {}",
            entry.instance.id, workout.id
        ))
    })?;
    let phase = if settings.is_recover_exercise(&slot.exercise.name) {
        Phase::Play
    } else {
        Phase::Transition
    };
    Ok(PlaythroughState {
        exercise_instance_id: entry.instance.id,
        workout,
        phase,
        timer: TimerLog::started_at(now),
    })
}

/// The entry, block and slot a state refers to
#[derive(Clone, Copy, Debug)]
pub struct Cursor<'a> {
    pub index: usize,
    pub entry: &'a SequencedEntry,
    pub block: &'a Block,
    pub slot: &'a ExerciseSlot,
}

impl<'a> Cursor<'a> {
    pub fn instance(&self) -> &'a ExerciseInstance {
        &self.entry.instance
    }

    /// Total length of the current phase, or `None` for an open-ended rep set
    pub fn phase_duration(
        &self,
        phase: Phase,
        settings: &PlaythroughSettings,
    ) -> Option<f64> {
        match (phase, self.slot.limit_type) {
            (Phase::Transition, _) => Some(
                self.block
                    .transition_time_seconds
                    .unwrap_or(settings.default_transition_seconds),
            ),
            (Phase::Play, LimitType::Reps) => None,
            (Phase::Play, LimitType::TimeSeconds) => Some(self.instance().limit_value),
        }
    }
}

impl PlaythroughState {
    /// Resolve the current entry against a sequence of this state's workout
    pub fn cursor<'a>(&'a self, sorted: &'a SortedEntries) -> Result<Cursor<'a>> {
        let index = sorted.index_of(self.exercise_instance_id).ok_or_else(|| {
            Error::Invariant(format!(
                "Unknown instance id {} in workout instance {}",
                self.exercise_instance_id, self.workout.id
            ))
        })?;
        let entry = sorted.get(index).ok_or_else(|| {
            Error::Invariant(format!("Sequence has no entry at index {}", index))
        })?;
        let block = entry.block(&self.workout).ok_or_else(|| {
            Error::Invariant(format!("Block {} missing from workout", entry.block_index))
        })?;
        let slot = entry.slot(&self.workout).ok_or_else(|| {
            Error::Invariant(format!(
                "Slot {} missing from block {}",
                entry.slot_index, entry.block_index
            ))
        })?;
        Ok(Cursor {
            index,
            entry,
            block,
            slot,
        })
    }

    pub fn is_paused(&self) -> Result<bool> {
        self.timer.is_paused()
    }

    /// Whole seconds left in the phase (rounded up), `None` when open-ended
    pub fn time_remaining(
        &self,
        sorted: &SortedEntries,
        settings: &PlaythroughSettings,
        now: DateTime<Utc>,
    ) -> Result<Option<i64>> {
        let cursor = self.cursor(sorted)?;
        let Some(duration) = cursor.phase_duration(self.phase, settings) else {
            // Still validate the log so an empty one is caught on every tick
            self.timer.is_paused()?;
            return Ok(None);
        };
        let elapsed = self.timer.elapsed_seconds(now)?;
        Ok(Some((duration - elapsed).ceil() as i64))
    }

    fn completion(&self, now: DateTime<Utc>) -> Result<ExerciseCompletion> {
        Ok(ExerciseCompletion {
            exercise_instance_id: self.exercise_instance_id,
            started: self.timer.start_time()?,
            finished: now,
            paused_time_seconds: self.timer.paused_seconds(now)?,
        })
    }
}

/// Apply one action to a playthrough
///
/// `sorted` must be the sequence of `state.workout`.
pub fn reduce(
    mut state: PlaythroughState,
    action: Action,
    sorted: &SortedEntries,
    settings: &PlaythroughSettings,
    now: DateTime<Utc>,
) -> Result<Outcome> {
    match action {
        Action::Advance => advance(state, sorted, settings, now),
        // Pause and resume are no-ops when the log is already there
        Action::Pause => {
            if !state.is_paused()? {
                state.timer.pause(now);
            }
            Ok(Outcome::Unchanged(state))
        }
        Action::Resume => {
            if state.is_paused()? {
                state.timer.resume(now);
            }
            Ok(Outcome::Unchanged(state))
        }
        Action::ToggleTimer => {
            let kind = state.timer.toggle(now)?;
            tracing::debug!(
                "Timer {} for {}",
                if kind == TimerEventKind::Pause { "paused" } else { "resumed" },
                state.exercise_instance_id
            );
            Ok(Outcome::Unchanged(state))
        }
        Action::Tick => match state.time_remaining(sorted, settings, now)? {
            Some(remaining) if remaining <= 0 => advance(state, sorted, settings, now),
            _ => Ok(Outcome::Unchanged(state)),
        },
    }
}

fn advance(
    state: PlaythroughState,
    sorted: &SortedEntries,
    settings: &PlaythroughSettings,
    now: DateTime<Utc>,
) -> Result<Outcome> {
    let index = state.cursor(sorted)?.index;

    if state.phase == Phase::Transition {
        tracing::info!("Starting exercise {}", state.exercise_instance_id);
        return Ok(Outcome::PlayStarted(PlaythroughState {
            phase: Phase::Play,
            timer: TimerLog::started_at(now),
            ..state
        }));
    }

    let completion = state.completion(now)?;
    match sorted.get(index + 1) {
        None => {
            tracing::info!("Finished last exercise of workout {}", state.workout.id);
            Ok(Outcome::WorkoutFinished {
                completion,
                workout: state.workout,
            })
        }
        Some(next_entry) => {
            let next = initial_state(state.workout, next_entry, settings, now)?;
            tracing::info!(
                "Finished exercise {}, moving to entry {} of {}",
                completion.exercise_instance_id,
                index + 2,
                sorted.len()
            );
            Ok(Outcome::ExerciseFinished { completion, next })
        }
    }
}

// ============================================================================
// Read model
// ============================================================================

/// Everything a frontend shows for the current phase, recomputed per tick
#[derive(Clone, Debug, PartialEq)]
pub struct PhaseView {
    pub phase_label: &'static str,
    pub quantity_text: String,
    pub time_remaining: Option<i64>,
    pub is_paused: bool,
    pub title: String,
    pub description: Option<String>,
    pub instance_notes: Option<String>,
    pub weight_lbs: Option<f64>,
    pub location: String,
    pub position: usize,
    pub total: usize,
}

/// `1 Rep`, `8 Reps`, `0 Seconds`
pub fn pluralize(word: &str, count: f64) -> String {
    if count == 1.0 {
        format!("{} {}", count, word)
    } else {
        format!("{} {}s", count, word)
    }
}

pub fn view(
    state: &PlaythroughState,
    sorted: &SortedEntries,
    settings: &PlaythroughSettings,
    now: DateTime<Utc>,
) -> Result<PhaseView> {
    let cursor = state.cursor(sorted)?;
    let time_remaining = state.time_remaining(sorted, settings, now)?;
    let instance = cursor.instance();

    let quantity_text = match (cursor.slot.limit_type, time_remaining) {
        (LimitType::Reps, _) => pluralize("Rep", instance.limit_value),
        (LimitType::TimeSeconds, Some(secs)) => pluralize("Second", secs as f64),
        (LimitType::TimeSeconds, None) => pluralize("Second", instance.limit_value),
    };

    let description: Vec<&str> = cursor
        .slot
        .description
        .iter()
        .chain(cursor.slot.exercise.description.iter())
        .chain(cursor.slot.variants.iter().filter_map(|v| v.description.as_ref()))
        .map(String::as_str)
        .filter(|s| !s.is_empty())
        .collect();

    let block_name = cursor
        .block
        .name
        .clone()
        .unwrap_or_else(|| format!("block {}", cursor.entry.block_index + 1));
    let location = format!(
        "{} - {} - set {} / {}",
        state.workout.definition.name, block_name, instance.set_iteration, cursor.block.sets_count
    );

    Ok(PhaseView {
        phase_label: match state.phase {
            Phase::Transition => "Get Ready",
            Phase::Play => "Go",
        },
        quantity_text,
        time_remaining,
        is_paused: state.is_paused()?,
        title: cursor.slot.title(),
        description: (!description.is_empty()).then(|| description.join("\n")),
        instance_notes: instance.description.clone(),
        weight_lbs: instance.weight_lbs,
        location,
        position: cursor.index + 1,
        total: sorted.len(),
    })
}

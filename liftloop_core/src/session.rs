//! Single-writer driver for one active playthrough.
//!
//! A [`PlaythroughSession`] owns the current [`PlaythroughState`] and is the
//! only thing allowed to change it. Frontends feed it user actions and ticks;
//! it runs the reducer, writes completions through the backend, re-sequences
//! from whatever the backend returns, plays the cue and keeps the navigation
//! stack pointing at the live state.
//!
//! Ticks carry the generation they were scheduled for. Every phase change
//! bumps the generation, so a tick scheduled against a superseded phase is
//! dropped instead of acting on stale state.

use crate::backend::{Cue, QuantityEdit, WorkoutBackend, WorkoutInstancePatch};
use crate::config::PlaythroughSettings;
use crate::nav::{NavStack, Screen};
use crate::playthrough::{self, initial_state, reduce, Action, Outcome, PhaseView, PlaythroughState};
use crate::related::apply_quantity_edit;
use crate::resume::next_position;
use crate::sequence::{sequence, SortedEntries};
use crate::{Error, Result, WorkoutInstance};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// What the frontend should do after a session call
#[derive(Clone, Debug, PartialEq)]
pub enum Step {
    /// Tick for a superseded phase; nothing happened
    Stale,
    /// Same phase, redraw
    Continue,
    /// A new phase or entry began; reschedule ticks for the new generation
    PhaseChanged,
    /// Last entry done; the navigation stack now shows the finished workout
    Finished(WorkoutInstance),
}

pub struct PlaythroughSession<'a, B, C> {
    backend: &'a mut B,
    cue: &'a C,
    nav: &'a mut NavStack,
    settings: PlaythroughSettings,
    state: PlaythroughState,
    sorted: SortedEntries,
    generation: u64,
    finished: bool,
}

impl<'a, B: WorkoutBackend, C: Cue> PlaythroughSession<'a, B, C> {
    /// Start (or continue) playing a workout instance
    ///
    /// An unstarted workout is marked started; a finished one is restarted.
    /// Play resumes after the most recently finished entry.
    pub fn start(
        backend: &'a mut B,
        cue: &'a C,
        nav: &'a mut NavStack,
        settings: PlaythroughSettings,
        workout_instance_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let mut workout = backend.get_workout_instance(workout_instance_id)?;
        if workout.started.is_none() || workout.finished.is_some() {
            let patch = WorkoutInstancePatch {
                started: Some(now),
                clear_finished: workout.finished.is_some(),
                ..Default::default()
            };
            workout = backend.patch_workout_instance(workout.id, &patch)?;
            tracing::info!("Started workout instance {}", workout.id);
        }

        let sorted = sequence(&workout);
        let position = next_position(&sorted.entries);
        let entry = sorted.get(position).ok_or_else(|| {
            Error::Validation(format!(
                "Workout instance {} has no exercises to play",
                workout.id
            ))
        })?;
        tracing::info!(
            "Playing '{}' from entry {} of {}",
            workout.definition.name,
            position + 1,
            sorted.len()
        );
        let state = initial_state(workout, entry, &settings, now)?;

        nav.push(Screen::Playthrough(state.clone()));
        Ok(Self {
            backend,
            cue,
            nav,
            settings,
            state,
            sorted,
            generation: 0,
            finished: false,
        })
    }

    /// Pick a playthrough back up from the navigation stack
    ///
    /// The workout is re-fetched; the state's exercise instance must still
    /// be part of it.
    pub fn resume(
        backend: &'a mut B,
        cue: &'a C,
        nav: &'a mut NavStack,
        settings: PlaythroughSettings,
    ) -> Result<Self> {
        let mut state = nav.playthrough()?.clone();
        let workout = backend.get_workout_instance(state.workout.id)?;
        let sorted = sequence(&workout);
        if sorted.index_of(state.exercise_instance_id).is_none() {
            return Err(Error::Invariant(format!(
                "Unknown instance id {} in workout instance {}",
                state.exercise_instance_id, workout.id
            )));
        }
        state.workout = workout;
        // Validates the timer log
        state.is_paused()?;

        nav.replace(Screen::Playthrough(state.clone()));
        Ok(Self {
            backend,
            cue,
            nav,
            settings,
            state,
            sorted,
            generation: 0,
            finished: false,
        })
    }

    pub fn state(&self) -> &PlaythroughState {
        &self.state
    }

    pub fn sorted(&self) -> &SortedEntries {
        &self.sorted
    }

    /// Token ticks must carry to be acted on
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn settings(&self) -> &PlaythroughSettings {
        &self.settings
    }

    /// Read model for the current phase
    pub fn view(&self, now: DateTime<Utc>) -> Result<PhaseView> {
        playthrough::view(&self.state, &self.sorted, &self.settings, now)
    }

    /// Periodic tick scheduled for `generation`
    pub fn tick(&mut self, generation: u64, now: DateTime<Utc>) -> Result<Step> {
        if generation != self.generation || self.finished {
            tracing::trace!(
                "Dropping tick for generation {} (current {})",
                generation,
                self.generation
            );
            return Ok(Step::Stale);
        }
        self.apply(Action::Tick, now)
    }

    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<Step> {
        self.apply(Action::Advance, now)
    }

    pub fn toggle_timer(&mut self, now: DateTime<Utc>) -> Result<Step> {
        self.apply(Action::ToggleTimer, now)
    }

    /// Run one action through the reducer and carry out its effects
    ///
    /// On a persistence failure the session has already moved on; the error
    /// is returned and the state is not rolled back.
    pub fn apply(&mut self, action: Action, now: DateTime<Utc>) -> Result<Step> {
        self.ensure_active()?;

        let outcome = reduce(self.state.clone(), action, &self.sorted, &self.settings, now)?;
        match outcome {
            Outcome::Unchanged(state) => {
                let redraw_only = action == Action::Tick;
                self.state = state;
                if !redraw_only {
                    self.sync_nav();
                }
                Ok(Step::Continue)
            }
            Outcome::PlayStarted(state) => {
                self.state = state;
                self.phase_changed();
                Ok(Step::PhaseChanged)
            }
            Outcome::ExerciseFinished { completion, next } => {
                self.state = next;
                self.phase_changed();
                let refreshed = self
                    .backend
                    .patch_exercise_instance(completion.exercise_instance_id, &(&completion).into())?;
                self.refresh(refreshed)?;
                Ok(Step::PhaseChanged)
            }
            Outcome::WorkoutFinished {
                completion,
                workout,
            } => {
                self.finished = true;
                self.generation += 1;
                self.play_cue();
                self.backend
                    .patch_exercise_instance(completion.exercise_instance_id, &(&completion).into())?;
                let done = self.backend.patch_workout_instance(
                    workout.id,
                    &WorkoutInstancePatch {
                        finished: Some(now),
                        ..Default::default()
                    },
                )?;
                tracing::info!("Finished workout instance {}", done.id);
                self.nav.replace(Screen::ViewWorkoutInstance(done.clone()));
                Ok(Step::Finished(done))
            }
        }
    }

    /// Set weight, limit or notes on the current exercise
    ///
    /// Pauses the timer first, then writes the edit to every instance it
    /// fans out to (paired sides, later sets) and re-sequences from the
    /// last response.
    pub fn set_quantity(&mut self, edit: &QuantityEdit, now: DateTime<Utc>) -> Result<Step> {
        self.ensure_active()?;
        if !self.state.is_paused()? {
            self.state.timer.pause(now);
        }
        self.sync_nav();

        let target = self.state.cursor(&self.sorted)?.instance().clone();
        let refreshed = apply_quantity_edit(&mut *self.backend, &self.state.workout, &target, edit)?;
        self.refresh(refreshed)?;
        Ok(Step::Continue)
    }

    fn ensure_active(&self) -> Result<()> {
        if self.finished {
            return Err(Error::Invariant(format!(
                "Playthrough of workout instance {} is already finished",
                self.state.workout.id
            )));
        }
        Ok(())
    }

    /// Replace the workout snapshot with a backend response and re-sequence
    fn refresh(&mut self, workout: WorkoutInstance) -> Result<()> {
        let sorted = sequence(&workout);
        if sorted.index_of(self.state.exercise_instance_id).is_none() {
            return Err(Error::Invariant(format!(
                "Unknown instance id {} in workout instance {}",
                self.state.exercise_instance_id, workout.id
            )));
        }
        self.sorted = sorted;
        self.state.workout = workout;
        self.sync_nav();
        Ok(())
    }

    fn phase_changed(&mut self) {
        self.generation += 1;
        self.sync_nav();
        self.play_cue();
    }

    fn sync_nav(&mut self) {
        self.nav.replace(Screen::Playthrough(self.state.clone()));
    }

    fn play_cue(&self) {
        if let Err(e) = self.cue.play() {
            tracing::warn!("Audible cue failed: {}", e);
        }
    }
}

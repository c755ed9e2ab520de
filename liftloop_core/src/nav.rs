//! Navigation screens and the navigation stack.
//!
//! Each screen a frontend can show is a variant carrying exactly the data it
//! needs. The playthrough screen carries the whole [`PlaythroughState`], so a
//! playthrough can be resumed from the stack alone.

use crate::playthrough::PlaythroughState;
use crate::{Error, Result, WorkoutInstance};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "screen", content = "data", rename_all = "snake_case")]
pub enum Screen {
    Home,
    ViewWorkoutInstance(WorkoutInstance),
    Playthrough(PlaythroughState),
}

impl Screen {
    pub fn name(&self) -> &'static str {
        match self {
            Screen::Home => "home",
            Screen::ViewWorkoutInstance(_) => "view_workout_instance",
            Screen::Playthrough(_) => "playthrough",
        }
    }
}

/// Stack of screens; the last one is showing
///
/// The root screen is never popped.
#[derive(Clone, Debug, PartialEq)]
pub struct NavStack {
    screens: Vec<Screen>,
}

impl Default for NavStack {
    fn default() -> Self {
        Self::new(Screen::Home)
    }
}

impl NavStack {
    pub fn new(root: Screen) -> Self {
        Self {
            screens: vec![root],
        }
    }

    pub fn current(&self) -> &Screen {
        // Never empty: `new` seeds a root and `pop` keeps it
        &self.screens[self.screens.len() - 1]
    }

    pub fn depth(&self) -> usize {
        self.screens.len()
    }

    pub fn push(&mut self, screen: Screen) {
        tracing::debug!("Navigating to {}", screen.name());
        self.screens.push(screen);
    }

    /// Go back one screen; `None` when already at the root
    pub fn pop(&mut self) -> Option<Screen> {
        if self.screens.len() == 1 {
            return None;
        }
        self.screens.pop()
    }

    /// Swap the showing screen for another without growing the stack
    pub fn replace(&mut self, screen: Screen) {
        let last = self.screens.len() - 1;
        self.screens[last] = screen;
    }

    /// Playthrough state of the showing screen
    pub fn playthrough(&self) -> Result<&PlaythroughState> {
        match self.current() {
            Screen::Playthrough(state) => Ok(state),
            other => Err(Error::Invariant(format!(
                "Expected a playthrough screen, found {}",
                other.name()
            ))),
        }
    }
}

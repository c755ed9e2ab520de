#![forbid(unsafe_code)]

//! Core domain model and playthrough logic for liftloop.
//!
//! This crate provides:
//! - Domain types (definitions, blocks, slots, instances, cycles)
//! - Entry sequencing and resume resolution
//! - The playthrough state machine and its single-writer session driver
//! - Variant pairing for quantity edits
//! - Persistence (file-backed store) and exercise history export

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod sequence;
pub mod related;
pub mod timer;
pub mod playthrough;
pub mod resume;
pub mod backend;
pub mod store;
pub mod history;
pub mod nav;
pub mod session;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{build_default_catalog, get_default_catalog};
pub use config::{Config, PlaythroughSettings};
pub use backend::{Cue, QuantityEdit, WorkoutBackend};
pub use store::{FileStore, StoreData};
pub use sequence::{sequence, SequencedEntry, SortedEntries};
pub use playthrough::{initial_state, reduce, Action, Phase, PhaseView, PlaythroughState};
pub use resume::next_position;
pub use nav::{NavStack, Screen};
pub use session::{PlaythroughSession, Step};

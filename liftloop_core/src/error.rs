//! Error types for the liftloop_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for liftloop_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A definition, cycle or instance id the backend does not know
    #[error("Not found: {0}")]
    NotFound(String),

    /// Broken internal invariant (empty timer log, dangling instance id, ...).
    /// Unrecoverable for the current view.
    #[error("Invariant violated: {0}")]
    Invariant(String),

    /// Malformed record
    #[error("Validation error: {0}")]
    Validation(String),

    /// Persistence failure reported by the backend
    #[error("Backend error: {0}")]
    Backend(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

//! Error types and Result aliases for Engine Console
//!
//! Errors never cross the session boundary as failures: the supervisor and
//! the session facade turn each of them into a system [`OutputEvent`] and
//! keep the engine in a recoverable state. The typed variants exist so the
//! internal layers (and tests) can tell what happened.
//!
//! [`OutputEvent`]: crate::models::OutputEvent

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for Engine Console operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Engine Console
#[derive(Debug, Error)]
pub enum Error {
    // === Locator errors ===
    /// The locator exhausted its search without finding the engine
    #[error("Engine executable not found (searched for {names:?})")]
    NotFound { names: Vec<String> },

    // === Process errors ===
    /// The OS refused to create the engine process
    #[error("Failed to spawn '{}': {source}", path.display())]
    SpawnFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing to the engine's stdin failed
    #[error("Failed to write to engine stdin: {0}")]
    WriteFailed(#[source] io::Error),

    /// Forced termination after the grace period failed
    #[error("Failed to terminate engine: {0}")]
    ForcedTerminationFailed(#[source] io::Error),

    /// Operation requires a running engine
    #[error("Engine is not running")]
    NotRunning,

    /// Start requested while an engine is alive or in transition
    #[error("Engine is already running")]
    AlreadyRunning,

    /// The engine's stdin pipe was not available after spawn
    #[error("Engine {0} pipe unavailable")]
    PipeUnavailable(&'static str),

    // === Configuration errors ===
    /// Failed to read a configuration file
    #[error("Failed to load config from '{}': {reason}", path.display())]
    ConfigLoadFailed { path: PathBuf, reason: String },

    /// Failed to parse a configuration file
    #[error("Failed to parse {format} config: {reason}")]
    ConfigParseFailed { format: String, reason: String },

    /// Failed to serialize configuration
    #[error("Failed to serialize config as {format}: {reason}")]
    ConfigSerializationFailed { format: String, reason: String },

    /// Configuration validation failed
    #[error("Configuration validation failed for '{field}': {reason}")]
    ConfigValidationFailed { field: String, reason: String },

    // === I/O ===
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Whether the error only means the engine was not in the right state
    ///
    /// These are reported to the host as warnings rather than errors.
    pub fn is_state_rejection(&self) -> bool {
        matches!(self, Error::NotRunning | Error::AlreadyRunning)
    }
}

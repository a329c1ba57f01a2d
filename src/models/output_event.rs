//! Output Event Model
//!
//! A single unit of text delivered to the host: an engine stdout line, an
//! engine stderr line, or a status message synthesized by the console
//! itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which source produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// A line the engine wrote to stdout
    Stdout,
    /// A line the engine wrote to stderr
    Stderr,
    /// A message produced by the console
    System,
}

/// Severity of a system event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warning,
    Error,
}

/// What a system event reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notice {
    /// The engine was spawned and is running
    Started,
    /// A requested stop completed
    Stopped,
    /// The engine process terminated (requested or not)
    Exited { code: Option<i32> },
    /// A command was written to the engine
    Sent,
    /// An operation needed a running engine
    NotRunning,
    /// The locator could not find the engine executable
    NotFound,
    /// The OS refused to start the engine
    SpawnFailed,
    /// Writing a command to the engine failed
    WriteFailed,
    /// Any other informational line (hints, separators)
    Info,
}

impl Notice {
    pub fn level(self) -> Level {
        match self {
            Notice::NotRunning => Level::Warning,
            Notice::NotFound | Notice::SpawnFailed | Notice::WriteFailed => Level::Error,
            _ => Level::Info,
        }
    }
}

/// A tagged line of console output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputEvent {
    /// Position in the event queue, starting at 0 for each session
    pub sequence: u64,

    /// Source of the line
    pub channel: Channel,

    /// Kind of system event; `None` for engine output
    #[serde(skip_serializing_if = "Option::is_none", flatten)]
    pub notice: Option<Notice>,

    /// The text, without line terminator
    pub text: String,

    /// When the event was queued
    pub timestamp: DateTime<Utc>,
}

impl OutputEvent {
    pub fn stdout(sequence: u64, text: impl Into<String>) -> Self {
        Self::new(sequence, Channel::Stdout, None, text.into())
    }

    pub fn stderr(sequence: u64, text: impl Into<String>) -> Self {
        Self::new(sequence, Channel::Stderr, None, text.into())
    }

    pub fn system(sequence: u64, notice: Notice, text: impl Into<String>) -> Self {
        Self::new(sequence, Channel::System, Some(notice), text.into())
    }

    fn new(sequence: u64, channel: Channel, notice: Option<Notice>, text: String) -> Self {
        Self {
            sequence,
            channel,
            notice,
            text,
            timestamp: Utc::now(),
        }
    }

    pub fn is_system(&self) -> bool {
        self.channel == Channel::System
    }

    /// Severity of the event; engine output counts as informational
    pub fn level(&self) -> Level {
        self.notice.map_or(Level::Info, Notice::level)
    }
}

/// Console rendering: stderr lines carry an `[ERR]` prefix
impl std::fmt::Display for OutputEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.channel {
            Channel::Stderr => write!(f, "[ERR] {}", self.text),
            Channel::Stdout | Channel::System => f.write_str(&self.text),
        }
    }
}

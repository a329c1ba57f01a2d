//! Engine Process Model
//!
//! Describes the supervised engine child: where it was launched from, its
//! OS identifier and how its run ended. The live process handle itself is
//! owned by the supervisor's exit watcher; this model is the inspectable
//! record of it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Represents the state of an engine process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ProcessState {
    /// Process is currently running
    #[default]
    Running,
    /// Process has terminated
    Terminated,
}

/// Record of one engine run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineProcess {
    /// Absolute path of the executable, resolved once at start
    pub executable: PathBuf,

    /// Directory the engine was started in (the executable's own directory)
    pub working_directory: PathBuf,

    /// OS process identifier
    pub pid: Option<u32>,

    /// Current state of the process
    pub state: ProcessState,

    /// When the process was started
    pub start_time: DateTime<Utc>,

    /// When the process terminated (if applicable)
    pub end_time: Option<DateTime<Utc>>,

    /// Exit code (if the process terminated with one)
    pub exit_code: Option<i32>,
}

impl EngineProcess {
    /// Create a record for a freshly spawned engine
    pub fn started(executable: PathBuf, working_directory: PathBuf, pid: Option<u32>) -> Self {
        Self {
            executable,
            working_directory,
            pid,
            state: ProcessState::Running,
            start_time: Utc::now(),
            end_time: None,
            exit_code: None,
        }
    }

    /// Mark the process as terminated
    ///
    /// `exit_code` is `None` when the process was ended by a signal.
    pub fn mark_terminated(&mut self, exit_code: Option<i32>) {
        self.state = ProcessState::Terminated;
        self.end_time = Some(Utc::now());
        self.exit_code = exit_code;
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, ProcessState::Running)
    }

    /// File name of the executable, for status displays
    pub fn file_name(&self) -> String {
        self.executable
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// How long the process ran, once it has terminated
    pub fn run_duration(&self) -> Option<std::time::Duration> {
        self.end_time
            .map(|end| end.signed_duration_since(self.start_time).to_std().unwrap_or_default())
    }
}

impl std::fmt::Display for EngineProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pid = self.pid.map_or("N/A".to_string(), |pid| pid.to_string());
        let state = match self.state {
            ProcessState::Running => "Running",
            ProcessState::Terminated => "Terminated",
        };
        write!(f, "{} [{}] - {}", self.file_name(), pid, state)?;
        if let Some(code) = self.exit_code {
            write!(f, " (exit: {})", code)?;
        }
        Ok(())
    }
}

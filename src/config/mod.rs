//! Configuration management for Engine Console
//!
//! Configuration covers where to look for the engine binary, how the
//! console behaves on startup and the default log level. Shutdown timing
//! and the sentinel line are constants in [`crate::process`].

pub mod loader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for Engine Console
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine executable search
    pub locator: LocatorConfig,

    /// Console behavior
    pub console: ConsoleConfig,

    /// Logging defaults
    pub logging: LoggingConfig,
}

/// Engine executable search configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// File names probed beside the console binary; the first one is also
    /// the name used for the conventional sub-paths and the recursive search
    pub file_names: Vec<String>,

    /// Build output directories probed at every level of the parent walk
    pub sub_dirs: Vec<PathBuf>,

    /// Number of directory levels walked, starting at the base directory
    pub max_parent_levels: usize,

    /// Directory the search starts from; defaults to the directory of the
    /// running executable
    pub base_dir: Option<PathBuf>,
}

impl LocatorConfig {
    /// Name used for sub-path probing and the recursive search
    pub fn primary_name(&self) -> Option<&str> {
        self.file_names.first().map(String::as_str)
    }
}

impl Default for LocatorConfig {
    fn default() -> Self {
        let suffix = std::env::consts::EXE_SUFFIX;
        Self {
            file_names: vec![format!("Db engine{suffix}"), format!("Db-engine{suffix}")],
            sub_dirs: vec![
                PathBuf::from("Db engine").join("Debug"),
                PathBuf::from("Db engine").join("Release"),
                PathBuf::from("Debug"),
                PathBuf::from("Release"),
            ],
            max_parent_levels: 5,
            base_dir: None,
        }
    }
}

/// Console behavior configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Start the engine as soon as the host is up
    pub auto_start: bool,

    /// Echo each sent command back as a system event
    pub echo_commands: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            auto_start: false,
            echo_commands: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` level when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Log levels accepted in `[logging] level`
pub const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace", "off"];

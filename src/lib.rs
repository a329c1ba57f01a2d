//! Engine Console - supervise a database engine and talk to it over stdio
//!
//! This library launches an external engine executable, relays everything it
//! writes to stdout and stderr as tagged lines, forwards typed commands to its
//! stdin and stops it with a graceful-then-forced shutdown.
//!
//! ## Module Organization
//!
//! - [`session`] - The facade a host drives ([`ConsoleSession`])
//! - [`process`] - Spawning, stdin writes, output relay and lifecycle supervision
//! - [`locator`] - Finding the engine executable on disk
//! - [`history`] - Shell-style recall of sent commands
//! - [`events`] - The single ordered event queue and output sinks
//! - [`models`] - Data structures ([`OutputEvent`], [`EngineProcess`])
//! - [`config`] - Configuration loading and validation
//! - [`mod@error`] - Error types and Result aliases
//!
//! ## Quick Start
//!
//! ```no_run
//! use engine_console::{init, ConsoleSession};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = init()?;
//! let mut session = ConsoleSession::new(&config);
//! let mut events = session.take_events().expect("fresh session");
//!
//! if session.start().await {
//!     session.send("SELECT 1;").await;
//! }
//! while let Some(event) = events.try_recv() {
//!     println!("{event}");
//! }
//! session.close().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! Every engine run has two reader tasks (stdout, stderr) and one exit
//! watcher task. They and the supervisor push into one unbounded queue; the
//! host drains it from a single place, so output is never rendered
//! concurrently and per-stream order is preserved.

#![allow(unexpected_cfgs)]

#[macro_use]
extern crate tracing;

pub mod config;
pub mod error;
pub mod events;
pub mod history;
pub mod locator;
pub mod models;
pub mod process;
pub mod session;

// Re-exports for core functionality
pub use config::{Config, ConsoleConfig, LocatorConfig, LoggingConfig};
pub use error::{Error, Result};
pub use events::{EventEmitter, OutputEvents, OutputSink};
pub use history::CommandHistory;
pub use locator::ExecutableLocator;
pub use models::{Channel, EngineProcess, Level, Notice, OutputEvent};
pub use process::{Supervisor, SupervisorState, GRACE_PERIOD, SHUTDOWN_SENTINEL};
pub use session::ConsoleSession;

pub use config::loader::ConfigLoader;

/// The current version of Engine Console from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The application name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// The application description from Cargo.toml
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Load configuration from the default search paths
///
/// A missing configuration file is not an error; built-in defaults are
/// used. A file that exists but does not parse or validate is.
///
/// # Examples
///
/// ```no_run
/// use engine_console::init;
///
/// match init() {
///     Ok(config) => println!("auto start: {}", config.console.auto_start),
///     Err(e) => eprintln!("Initialization failed: {}", e),
/// }
/// ```
pub fn init() -> Result<Config> {
    info!("Initializing {} v{}", NAME, VERSION);
    let config = ConfigLoader::load()?;
    debug!(?config, "Configuration ready");
    Ok(config)
}

/// Load configuration from an explicit file, which must exist
pub fn init_with_config(config_path: &std::path::Path) -> Result<Config> {
    info!(
        "Initializing {} v{} with config: {}",
        NAME,
        VERSION,
        config_path.display()
    );

    if !config_path.exists() {
        return Err(Error::ConfigLoadFailed {
            path: config_path.to_path_buf(),
            reason: "Configuration file does not exist".to_string(),
        });
    }

    ConfigLoader::load_from_path(config_path)
}

/// Human-readable startup failure with suggested remedies
pub fn handle_startup_error(error: &Error) -> String {
    match error {
        Error::ConfigLoadFailed { path, reason } => {
            format!(
                "Configuration Error: Failed to load config from '{}': {}\n\nTry:\n• Check the file path and permissions\n• Run without --config to use defaults",
                path.display(),
                reason
            )
        }
        Error::ConfigParseFailed { format, reason } => {
            format!(
                "Configuration Error: Failed to parse {} config: {}\n\nTry:\n• Check configuration file syntax\n• Ensure file is valid {}",
                format, reason, format
            )
        }
        Error::ConfigValidationFailed { field, reason } => {
            format!(
                "Configuration Error: Validation failed for '{}': {}\n\nTry:\n• Check configuration value\n• Remove the field to use its default",
                field, reason
            )
        }
        Error::Io(err) => {
            format!(
                "I/O Error: {}\n\nTry:\n• Check file permissions\n• Ensure required directories exist",
                err
            )
        }
        _ => {
            format!(
                "Unexpected Error: {}\n\nPlease report this issue with debug logs enabled",
                error
            )
        }
    }
}

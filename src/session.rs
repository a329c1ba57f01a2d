//! Console Session
//!
//! The surface a host talks to. A session ties together the locator, the
//! supervisor, the command history and the event queue, and turns every
//! failure into a system event instead of an error return.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::config::{Config, ConsoleConfig};
use crate::error::Error;
use crate::events::{self, EventEmitter, OutputEvents, OutputSink};
use crate::history::CommandHistory;
use crate::locator::ExecutableLocator;
use crate::models::{EngineProcess, Notice};
use crate::process::{Supervisor, SupervisorState};

/// One interactive console over one engine
pub struct ConsoleSession {
    supervisor: Arc<Supervisor>,
    locator: ExecutableLocator,
    console: ConsoleConfig,
    events: EventEmitter,
    output: Option<OutputEvents>,
    history: CommandHistory,
}

impl ConsoleSession {
    pub fn new(config: &Config) -> Self {
        Self::with_locator(
            config.console.clone(),
            ExecutableLocator::new(config.locator.clone()),
        )
    }

    pub fn with_locator(console: ConsoleConfig, locator: ExecutableLocator) -> Self {
        let (emitter, output) = events::channel();
        Self {
            supervisor: Arc::new(Supervisor::new(emitter.clone())),
            locator,
            console,
            events: emitter,
            output: Some(output),
            history: CommandHistory::new(),
        }
    }

    /// Hand the event queue to the host; only the first call gets it
    pub fn take_events(&mut self) -> Option<OutputEvents> {
        self.output.take()
    }

    /// Deliver every event to `sink` from a single dispatcher task
    ///
    /// Returns `None` when the queue was already taken.
    pub fn on_output<S: OutputSink>(&mut self, sink: S) -> Option<JoinHandle<()>> {
        let output = self.take_events()?;
        Some(events::spawn_dispatcher(output, sink))
    }

    /// Locate and start the engine
    ///
    /// Returns whether the engine is running afterwards. Starting an
    /// engine that is already running does nothing.
    pub async fn start(&self) -> bool {
        if self.supervisor.is_running() {
            debug!("Start requested while engine is running");
            return true;
        }

        let Some(path) = self.locate().await else {
            self.report_not_found();
            return false;
        };

        match self.supervisor.start(&path).await {
            Ok(()) => true,
            Err(e) if e.is_state_rejection() => self.supervisor.is_running(),
            Err(e) => {
                debug!(error = %e, "Engine start failed");
                false
            }
        }
    }

    /// Start only when fully stopped; used for auto-start on host load
    pub async fn start_if_stopped(&self) -> bool {
        match self.supervisor.state() {
            SupervisorState::Stopped => self.start().await,
            state => state == SupervisorState::Running,
        }
    }

    /// Start if the configuration asks for it
    pub async fn auto_start(&self) -> bool {
        if !self.console.auto_start {
            return false;
        }
        info!("Auto-starting engine");
        self.start_if_stopped().await
    }

    /// Stop the engine, waiting out the grace period if needed
    pub async fn stop(&self) {
        if let Err(e) = self.supervisor.stop().await {
            debug!(error = %e, "Stop rejected");
        }
    }

    /// Stop on a background task so the caller never waits
    pub fn stop_in_background(&self) -> JoinHandle<()> {
        let supervisor = Arc::clone(&self.supervisor);
        tokio::spawn(async move {
            if let Err(e) = supervisor.stop().await {
                debug!(error = %e, "Background stop rejected");
            }
        })
    }

    /// Send one command line to the engine
    ///
    /// Surrounding whitespace is trimmed and blank input is ignored without
    /// any event. Returns whether the command reached the engine's stdin.
    ///
    /// The `> command` echo is queued once the write has succeeded, so a
    /// fast engine's first reply line can be queued ahead of it. A failed
    /// write is never echoed.
    pub async fn send(&mut self, text: &str) -> bool {
        let command = text.trim();
        if command.is_empty() {
            return false;
        }

        match self.supervisor.send(command).await {
            Ok(()) => {
                self.history.record(command);
                if self.console.echo_commands {
                    self.events.system(Notice::Sent, format!("> {command}"));
                }
                true
            }
            Err(e) => {
                debug!(error = %e, "Command not sent");
                false
            }
        }
    }

    /// Queue an informational system line, for host-side notices
    pub fn notify(&self, text: impl Into<String>) {
        self.events.system(Notice::Info, text);
    }

    /// Stop the engine as the host goes away
    pub async fn close(&self) {
        info!("Closing console session");
        self.stop().await;
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut CommandHistory {
        &mut self.history
    }

    pub fn recall_previous(&mut self, current: &str) -> String {
        self.history.recall_previous(current)
    }

    pub fn recall_next(&mut self, current: &str) -> String {
        self.history.recall_next(current)
    }

    pub fn state(&self) -> SupervisorState {
        self.supervisor.state()
    }

    pub fn is_running(&self) -> bool {
        self.supervisor.is_running()
    }

    pub fn process(&self) -> Option<EngineProcess> {
        self.supervisor.process()
    }

    pub fn locator(&self) -> &ExecutableLocator {
        &self.locator
    }

    async fn locate(&self) -> Option<PathBuf> {
        // The recursive fallback can walk large trees
        let locator = self.locator.clone();
        match tokio::task::spawn_blocking(move || locator.locate()).await {
            Ok(found) => found,
            Err(e) => {
                debug!(error = %e, "Locator task failed");
                None
            }
        }
    }

    fn report_not_found(&self) {
        let names = self.locator.config().file_names.clone();
        let err = Error::NotFound {
            names: names.clone(),
        };
        warn!(error = %err, "Cannot start engine");

        self.events
            .system(Notice::NotFound, "Error: engine executable not found");
        self.events.system(
            Notice::NotFound,
            format!("  Looked for: {}", names.join(", ")),
        );
        self.events
            .system(Notice::NotFound, "  Build the 'Db engine' project first.");
        self.events.system(
            Notice::NotFound,
            "  Or point [locator] base_dir at the build output in the configuration.",
        );
    }
}

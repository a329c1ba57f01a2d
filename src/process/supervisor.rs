//! Engine Supervisor
//!
//! Owns at most one live engine and walks it through
//! `Stopped → Starting → Running → Stopping → Stopped`. An engine that
//! exits on its own goes straight from `Running` to `Stopped`.
//!
//! Each run gets its own exit watcher task. The watcher owns the child
//! handle, waits for it to exit (or for a kill request), lets the output
//! readers drain, and then queues the run's single "Engine exited." event.
//! A run generation counter keeps a late watcher from touching a newer run.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::process::Child;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use super::input::EngineInput;
use super::relay::Relay;
use super::spawn::spawn_engine;
use crate::error::{Error, Result};
use crate::events::EventEmitter;
use crate::models::{EngineProcess, Notice};

/// Line written to the engine's stdin to request a clean shutdown
pub const SHUTDOWN_SENTINEL: &str = "EXIT";

/// How long a stop waits for the engine to honour the sentinel
pub const GRACE_PERIOD: Duration = Duration::from_millis(1500);

/// How long the exit watcher waits for the output readers after exit
const READER_DRAIN: Duration = Duration::from_millis(250);

/// How long a stop waits for the watcher once termination was forced
const KILL_WAIT: Duration = Duration::from_secs(2);

/// Lifecycle state of the supervised engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SupervisorState {
    #[default]
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl std::fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SupervisorState::Stopped => "stopped",
            SupervisorState::Starting => "starting",
            SupervisorState::Running => "running",
            SupervisorState::Stopping => "stopping",
        };
        f.write_str(name)
    }
}

/// Per-run handles held while an engine is live
struct ActiveEngine {
    generation: u64,
    input: EngineInput,
    kill: Option<oneshot::Sender<()>>,
    watcher: JoinHandle<()>,
}

#[derive(Default)]
struct Inner {
    state: SupervisorState,
    generation: u64,
    active: Option<ActiveEngine>,
    /// Record of the current run, or the last one once it ended
    process: Option<EngineProcess>,
}

/// Starts, stops and talks to one engine process
pub struct Supervisor {
    inner: Arc<Mutex<Inner>>,
    events: EventEmitter,
}

impl Supervisor {
    pub fn new(events: EventEmitter) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            events,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.lock().state
    }

    pub fn is_running(&self) -> bool {
        self.state() == SupervisorState::Running
    }

    /// Snapshot of the current or most recent engine run
    pub fn process(&self) -> Option<EngineProcess> {
        self.lock().process.clone()
    }

    /// OS process id of the live engine
    pub fn pid(&self) -> Option<u32> {
        let inner = self.lock();
        match inner.state {
            SupervisorState::Running | SupervisorState::Stopping => {
                inner.process.as_ref().and_then(|p| p.pid)
            }
            _ => None,
        }
    }

    /// Spawn the engine at `path`
    ///
    /// Rejected with [`Error::AlreadyRunning`] unless the supervisor is
    /// stopped. On spawn failure an error event is queued and the state
    /// returns to `Stopped`.
    pub async fn start(&self, path: &Path) -> Result<()> {
        let generation = {
            let mut inner = self.lock();
            if inner.state != SupervisorState::Stopped {
                debug!(state = %inner.state, "Start ignored");
                return Err(Error::AlreadyRunning);
            }
            inner.state = SupervisorState::Starting;
            inner.generation += 1;
            inner.generation
        };

        let spawned = match spawn_engine(path) {
            Ok(spawned) => spawned,
            Err(err) => {
                self.lock().state = SupervisorState::Stopped;
                let reason = match &err {
                    Error::SpawnFailed { source, .. } => source.to_string(),
                    other => other.to_string(),
                };
                self.events
                    .system(Notice::SpawnFailed, format!("Failed to start engine: {reason}"));
                return Err(err);
            }
        };

        // Queue "started" before any engine output and before the watcher
        // can observe the run.
        let mut inner = self.lock();
        self.events
            .system(Notice::Started, "Engine started successfully.");

        let relay = Relay::start(spawned.stdout, spawned.stderr, self.events.clone());
        let (kill_tx, kill_rx) = oneshot::channel();
        let watcher = tokio::spawn(watch_exit(
            spawned.child,
            kill_rx,
            relay,
            Arc::clone(&self.inner),
            self.events.clone(),
            generation,
        ));

        inner.active = Some(ActiveEngine {
            generation,
            input: EngineInput::new(spawned.stdin),
            kill: Some(kill_tx),
            watcher,
        });
        inner.process = Some(spawned.process);
        inner.state = SupervisorState::Running;
        Ok(())
    }

    /// Ask the engine to exit, forcing termination after [`GRACE_PERIOD`]
    ///
    /// Returns once the engine is gone and the state is `Stopped`.
    pub async fn stop(&self) -> Result<()> {
        let mut active = {
            let mut inner = self.lock();
            match inner.active.take() {
                Some(active) if inner.state == SupervisorState::Running => {
                    inner.state = SupervisorState::Stopping;
                    active
                }
                other => {
                    inner.active = other;
                    drop(inner);
                    self.events
                        .system(Notice::NotRunning, "Engine is not running.");
                    return Err(Error::NotRunning);
                }
            }
        };

        info!(generation = active.generation, "Stopping engine");

        // The sentinel write sits inside the grace period too; an engine
        // that stopped reading stdin must not stall the stop.
        let input = active.input.clone();
        let watcher = &mut active.watcher;
        let graceful = timeout(GRACE_PERIOD, async move {
            if let Err(e) = input.write_line(SHUTDOWN_SENTINEL).await {
                debug!(error = %e, "Shutdown sentinel not delivered");
            }
            let _ = watcher.await;
        })
        .await;

        if graceful.is_err() {
            warn!(grace = ?GRACE_PERIOD, "Engine ignored shutdown request, terminating");
            if let Some(kill) = active.kill.take() {
                if kill.send(()).is_err() {
                    debug!("Exit watcher already finished");
                }
            }
            if timeout(KILL_WAIT, &mut active.watcher).await.is_err() {
                debug!("Exit watcher still running after forced termination");
                active.watcher.abort();
            }
        }

        if timeout(KILL_WAIT, active.input.close()).await.is_err() {
            debug!("Engine stdin still busy after stop");
        }

        {
            let mut inner = self.lock();
            inner.state = SupervisorState::Stopped;
            self.events.system(Notice::Stopped, "Engine stopped.");
        }
        info!(generation = active.generation, "Engine stopped");
        Ok(())
    }

    /// Write one command line to the engine's stdin
    ///
    /// The write itself happens outside the state lock, so a slow engine
    /// never blocks state queries.
    pub async fn send(&self, text: &str) -> Result<()> {
        let input = {
            let inner = self.lock();
            match (&inner.state, &inner.active) {
                (SupervisorState::Running, Some(active)) => active.input.clone(),
                _ => {
                    drop(inner);
                    self.events
                        .system(Notice::NotRunning, "Engine is not running. Start it first.");
                    return Err(Error::NotRunning);
                }
            }
        };

        if let Err(e) = input.write_line(text).await {
            self.events
                .system(Notice::WriteFailed, format!("Failed to send command: {e}"));
            return Err(Error::WriteFailed(e));
        }
        trace!(len = text.len(), "Command written to engine");
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock_inner(&self.inner)
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        let mut inner = lock_inner(&self.inner);
        if let Some(mut active) = inner.active.take() {
            debug!(generation = active.generation, "Supervisor dropped with live engine");
            if let Some(kill) = active.kill.take() {
                let _ = kill.send(());
            }
        }
    }
}

fn lock_inner(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    match inner.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Wait for one engine run to end and report it
async fn watch_exit(
    mut child: Child,
    mut kill: oneshot::Receiver<()>,
    relay: Relay,
    inner: Arc<Mutex<Inner>>,
    events: EventEmitter,
    generation: u64,
) {
    let status = tokio::select! {
        status = child.wait() => status,
        Ok(()) = &mut kill => {
            if let Err(e) = child.start_kill() {
                let err = Error::ForcedTerminationFailed(e);
                debug!(error = %err, "Engine likely exited already");
            }
            child.wait().await
        }
    };

    let code = match status {
        Ok(status) => status.code(),
        Err(e) => {
            debug!(error = %e, "Waiting for engine exit failed");
            None
        }
    };

    relay.drain(READER_DRAIN).await;

    let mut guard = lock_inner(&inner);
    if guard.generation == generation {
        if let Some(process) = guard.process.as_mut() {
            process.mark_terminated(code);
        }
        if guard.state == SupervisorState::Running {
            info!(?code, "Engine exited on its own");
            guard.state = SupervisorState::Stopped;
            guard.active = None;
        }
    }
    events.system(Notice::Exited { code }, "Engine exited.");
}

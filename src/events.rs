//! Event Queue
//!
//! Every producer in the console (the stdout reader, the stderr reader, the
//! exit watcher and the supervisor itself) pushes into one unbounded queue.
//! The host drains it from a single place, either directly through
//! [`OutputEvents`] or through an [`OutputSink`] driven by
//! [`spawn_dispatcher`]. Sequence numbers are assigned under the same lock
//! that enqueues, so sequence order is queue order.

use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::models::{Channel, Level, Notice, OutputEvent};

/// Create a connected emitter / receiver pair
pub fn channel() -> (EventEmitter, OutputEvents) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        EventEmitter {
            inner: Arc::new(Mutex::new(EmitterState { next: 0, tx })),
        },
        OutputEvents { rx },
    )
}

struct EmitterState {
    next: u64,
    tx: UnboundedSender<OutputEvent>,
}

/// Cloneable producer side of the event queue
#[derive(Clone)]
pub struct EventEmitter {
    inner: Arc<Mutex<EmitterState>>,
}

impl EventEmitter {
    /// Queue a line the engine wrote to stdout
    pub fn stdout(&self, text: impl Into<String>) {
        self.push(|seq| OutputEvent::stdout(seq, text));
    }

    /// Queue a line the engine wrote to stderr
    pub fn stderr(&self, text: impl Into<String>) {
        self.push(|seq| OutputEvent::stderr(seq, text));
    }

    /// Queue a console status message
    pub fn system(&self, notice: Notice, text: impl Into<String>) {
        let text = text.into();
        match notice.level() {
            Level::Error => warn!(?notice, "{}", text),
            Level::Warning | Level::Info => debug!(?notice, "{}", text),
        }
        self.push(|seq| OutputEvent::system(seq, notice, text));
    }

    /// Queue a line on the given engine channel
    pub fn line(&self, channel: Channel, text: String) {
        match channel {
            Channel::Stdout => self.stdout(text),
            Channel::Stderr => self.stderr(text),
            Channel::System => self.system(Notice::Info, text),
        }
    }

    fn push(&self, build: impl FnOnce(u64) -> OutputEvent) {
        let mut state = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let event = build(state.next);
        if state.tx.send(event).is_err() {
            // Host dropped the receiver; nothing left to deliver to.
            trace!("event queue closed, dropping event");
            return;
        }
        state.next += 1;
    }
}

/// Consumer side of the event queue
pub struct OutputEvents {
    rx: UnboundedReceiver<OutputEvent>,
}

impl OutputEvents {
    /// Wait for the next event; `None` once every producer is gone
    pub async fn recv(&mut self) -> Option<OutputEvent> {
        self.rx.recv().await
    }

    /// Take the next event if one is already queued
    pub fn try_recv(&mut self) -> Option<OutputEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Blocking receive for hosts that drain from a plain thread
    ///
    /// Panics if called from within an async runtime.
    pub fn blocking_recv(&mut self) -> Option<OutputEvent> {
        self.rx.blocking_recv()
    }

    /// Drain everything queued right now
    pub fn drain(&mut self) -> Vec<OutputEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_recv() {
            events.push(event);
        }
        events
    }
}

/// Receives console output on the host side
pub trait OutputSink: Send + 'static {
    fn on_event(&mut self, event: OutputEvent);
}

impl<F> OutputSink for F
where
    F: FnMut(OutputEvent) + Send + 'static,
{
    fn on_event(&mut self, event: OutputEvent) {
        self(event)
    }
}

/// Drive `sink` from a single task until the queue closes
pub fn spawn_dispatcher<S: OutputSink>(mut events: OutputEvents, mut sink: S) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            sink.on_event(event);
        }
        debug!("output dispatcher exiting");
    })
}

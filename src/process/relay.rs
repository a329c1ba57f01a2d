//! Output Relay
//!
//! One reader task per engine output stream. Each reader turns the stream
//! into lines and queues them on its channel as soon as they arrive. A
//! reader ends quietly at end of stream; read errors end it too, with a
//! debug log.

use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::events::EventEmitter;
use crate::models::Channel;

/// Handles of the running stdout and stderr readers
pub struct Relay {
    stdout: JoinHandle<()>,
    stderr: JoinHandle<()>,
}

impl Relay {
    /// Start both readers
    pub fn start<O, E>(stdout: O, stderr: E, events: EventEmitter) -> Self
    where
        O: AsyncRead + Unpin + Send + 'static,
        E: AsyncRead + Unpin + Send + 'static,
    {
        Self {
            stdout: tokio::spawn(read_lines(stdout, Channel::Stdout, events.clone())),
            stderr: tokio::spawn(read_lines(stderr, Channel::Stderr, events)),
        }
    }

    /// Wait up to `limit` for both readers to reach end of stream
    ///
    /// Readers still running after `limit` (a grandchild holding the pipe
    /// open, say) are aborted.
    pub async fn drain(self, limit: Duration) {
        let Relay {
            mut stdout,
            mut stderr,
        } = self;
        let finished = timeout(limit, async {
            let _ = (&mut stdout).await;
            let _ = (&mut stderr).await;
        })
        .await;
        if finished.is_err() {
            debug!(?limit, "Output readers still open after exit, aborting");
            stdout.abort();
            stderr.abort();
        }
    }
}

/// Queue every line of `reader` on `channel` until end of stream
///
/// Lines are split on `\n`; a trailing `\r` is dropped. Invalid UTF-8 is
/// replaced rather than rejected.
pub async fn read_lines<R>(reader: R, channel: Channel, events: EventEmitter)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                }
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }
                events.line(channel, String::from_utf8_lossy(&buf).into_owned());
            }
            Err(e) => {
                debug!(?channel, error = %e, "Engine output read failed");
                break;
            }
        }
    }
    trace!(?channel, "Output reader exiting");
}

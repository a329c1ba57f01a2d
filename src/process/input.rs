//! Engine stdin writer
//!
//! Shared handle over the engine's stdin. Each command goes out as one
//! `write_all` of the text plus `\n`, followed by a flush, under a lock so
//! concurrent writers never interleave within a line.

use std::io;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::process::ChildStdin;
use tokio::sync::Mutex;

/// Line-oriented writer for the engine's stdin
pub struct EngineInput<W = ChildStdin> {
    writer: Arc<Mutex<Option<W>>>,
}

impl<W> Clone for EngineInput<W> {
    fn clone(&self) -> Self {
        Self {
            writer: Arc::clone(&self.writer),
        }
    }
}

impl<W: AsyncWrite + Unpin + Send> EngineInput<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Arc::new(Mutex::new(Some(writer))),
        }
    }

    /// Write `line` followed by a line terminator and flush
    ///
    /// No framing or escaping is applied.
    pub async fn write_line(&self, line: &str) -> io::Result<()> {
        let mut guard = self.writer.lock().await;
        let Some(writer) = guard.as_mut() else {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "engine stdin closed"));
        };
        let mut buf = Vec::with_capacity(line.len() + 1);
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
        writer.write_all(&buf).await?;
        writer.flush().await
    }

    /// Close stdin; later writes fail with `BrokenPipe`
    pub async fn close(&self) {
        let mut guard = self.writer.lock().await;
        if let Some(mut writer) = guard.take() {
            if let Err(e) = writer.shutdown().await {
                debug!(error = %e, "Closing engine stdin failed");
            }
        }
    }
}

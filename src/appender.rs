//! Durable log persistence
//!
//! A single actor task owns the append path: each accepted record becomes
//! one JSON line at the end of the configured file. Funneling every write
//! through one task keeps concurrent submissions from interleaving partial
//! lines, and the outcome of each append is reported back to the
//! connection that requested it. The file is only ever appended to, never
//! truncated or rewritten.

use crate::types::LogRecord;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot};

/// Message types for the appender actor
pub enum AppenderMessage {
    Append {
        record: LogRecord,
        response_tx: oneshot::Sender<Result<()>>,
    },
}

/// Handle to communicate with the appender actor
#[derive(Clone)]
pub struct LogAppenderHandle {
    tx: mpsc::Sender<AppenderMessage>,
}

impl LogAppenderHandle {
    /// Append one record to the log file and wait for the outcome.
    ///
    /// I/O failures surface here untouched; there is no retry and no
    /// buffering, so whether to drop the record is the caller's decision.
    pub async fn append(&self, record: LogRecord) -> Result<()> {
        let (response_tx, response_rx) = oneshot::channel();

        self.tx
            .send(AppenderMessage::Append {
                record,
                response_tx,
            })
            .await
            .map_err(|_| anyhow::anyhow!("log appender actor has shut down"))?;

        response_rx
            .await
            .map_err(|_| anyhow::anyhow!("log appender actor dropped response channel"))?
    }
}

/// The appender actor
pub struct LogAppender;

impl LogAppender {
    /// Spawn the actor that appends to `path` and return a handle to it.
    ///
    /// The file is created on first append rather than up front, so a
    /// misconfigured path shows up as per-append errors instead of a
    /// startup failure.
    pub fn spawn(path: PathBuf, buffer_size: usize) -> LogAppenderHandle {
        let (tx, rx) = mpsc::channel(buffer_size);
        tokio::spawn(run_appender(rx, path));
        LogAppenderHandle { tx }
    }
}

async fn run_appender(mut rx: mpsc::Receiver<AppenderMessage>, path: PathBuf) {
    while let Some(msg) = rx.recv().await {
        match msg {
            AppenderMessage::Append {
                record,
                response_tx,
            } => {
                // Ignore send errors - the requesting connection may be gone
                let _ = response_tx.send(append_line(&path, &record).await);
            }
        }
    }

    tracing::debug!("log appender actor shutting down");
}

async fn append_line(path: &Path, record: &LogRecord) -> Result<()> {
    let mut line = serde_json::to_string(record).context("failed to serialize log record")?;
    line.push('\n');

    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .await
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    file.write_all(line.as_bytes())
        .await
        .with_context(|| format!("failed to append to log file {}", path.display()))?;
    file.flush().await?;

    Ok(())
}

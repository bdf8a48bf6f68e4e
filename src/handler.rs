//! Per-connection processing
//!
//! Exactly one submission is read per connection; clients open a fresh
//! connection for every record. Nothing is ever written back: success,
//! rejection, and failure all look the same to the client, a closed
//! connection.

use crate::actor::RateLimiterHandle;
use crate::appender::LogAppenderHandle;
use crate::types::LogSubmission;
use anyhow::{Context, Result};
use chrono::Utc;
use chrono_tz::Tz;
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;

/// Process a single accepted connection end-to-end.
///
/// Reads one newline-terminated JSON submission, applies the rate limit,
/// stamps the record with the receipt time and the peer's address, and
/// hands it to the appender. The socket is dropped, and with it closed, on
/// every exit path. Errors returned here are socket-level; policy outcomes
/// (rejection, undecodable input, append failure) are logged for the
/// operator and swallowed.
pub async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    limiter: RateLimiterHandle,
    appender: LogAppenderHandle,
    timezone: Tz,
) -> Result<()> {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    let bytes_read = reader
        .read_line(&mut line)
        .await
        .context("failed to read submission")?;
    if bytes_read == 0 {
        // Disconnected without sending anything
        return Ok(());
    }

    let client_ip = peer_addr.ip();
    if !limiter.admit(client_ip.to_string()).await? {
        tracing::info!("rate limit triggered for {client_ip}");
        return Ok(());
    }

    let submission: LogSubmission = match serde_json::from_str(line.trim_end()) {
        Ok(submission) => submission,
        Err(e) => {
            tracing::warn!("discarding undecodable submission from {client_ip}: {e}");
            return Ok(());
        }
    };

    let record = submission.into_record(client_ip, Utc::now().with_timezone(&timezone));
    let message = record.message.clone();
    if let Err(e) = appender.append(record).await {
        tracing::error!("failed to persist record from {client_ip}: {e:#}");
        return Ok(());
    }

    tracing::info!("logged from {client_ip}: {message}");
    Ok(())
}

//! Listening socket and accept loop

use crate::actor::RateLimiterHandle;
use crate::appender::LogAppenderHandle;
use crate::config::Config;
use crate::handler::handle_connection;
use anyhow::{Context, Result};
use chrono_tz::Tz;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinSet;

/// The ingestion server: a bound listening socket plus the handles every
/// connection task needs.
pub struct IngestServer {
    listener: TcpListener,
    limiter: RateLimiterHandle,
    appender: LogAppenderHandle,
    timezone: Tz,
}

impl IngestServer {
    /// Bind the listening socket.
    ///
    /// Failure here (port in use, insufficient privilege) is fatal to
    /// startup and is not retried.
    pub async fn bind(
        config: &Config,
        limiter: RateLimiterHandle,
        appender: LogAppenderHandle,
    ) -> Result<Self> {
        let addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind listening socket on {addr}"))?;

        Ok(IngestServer {
            listener,
            limiter,
            appender,
            timezone: config.timezone,
        })
    }

    /// The address the server is actually listening on.
    ///
    /// Differs from the configured port when that port is 0 and the OS
    /// picked one.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the process is stopped.
    ///
    /// Every accepted connection runs as its own task in a supervised set:
    /// the loop that accepts also reaps finished tasks, so a panicking
    /// handler is logged rather than silently lost, and no handler outcome
    /// ever stalls the accept path.
    pub async fn serve(self) -> Result<()> {
        tracing::info!("listening on {}", self.listener.local_addr()?);

        let mut connections: JoinSet<()> = JoinSet::new();
        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    let (stream, peer_addr) = accepted.context("failed to accept connection")?;
                    tracing::debug!("client connected: {peer_addr}");

                    let limiter = self.limiter.clone();
                    let appender = self.appender.clone();
                    let timezone = self.timezone;
                    connections.spawn(async move {
                        if let Err(e) =
                            handle_connection(stream, peer_addr, limiter, appender, timezone).await
                        {
                            tracing::error!("connection error from {peer_addr}: {e:#}");
                        }
                        tracing::debug!("client disconnected: {peer_addr}");
                    });
                }
                Some(finished) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = finished {
                        tracing::error!("connection task failed: {e}");
                    }
                }
            }
        }
    }
}

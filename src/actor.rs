//! Shared access to the rate limiter
//!
//! The admission map is owned by a single actor task; connection handlers
//! talk to it through a cloneable handle. Serializing every check through
//! one task makes the read-then-update for a key atomic without locking,
//! so two near-simultaneous submissions from the same client can never
//! both be admitted.

use crate::limiter::RateLimiter;
use anyhow::Result;
use tokio::sync::{mpsc, oneshot};

/// Message types for the rate limiter actor
pub enum RateLimiterMessage {
    Admit {
        client_id: String,
        response_tx: oneshot::Sender<bool>,
    },
}

/// Handle to communicate with the rate limiter actor
#[derive(Clone)]
pub struct RateLimiterHandle {
    tx: mpsc::Sender<RateLimiterMessage>,
}

impl RateLimiterHandle {
    /// Ask for admission of one submission from `client_id`.
    ///
    /// The error covers only a dead actor, never a policy decision.
    pub async fn admit(&self, client_id: String) -> Result<bool> {
        let (response_tx, response_rx) = oneshot::channel();

        self.tx
            .send(RateLimiterMessage::Admit {
                client_id,
                response_tx,
            })
            .await
            .map_err(|_| anyhow::anyhow!("rate limiter actor has shut down"))?;

        response_rx
            .await
            .map_err(|_| anyhow::anyhow!("rate limiter actor dropped response channel"))
    }
}

/// The rate limiter actor
pub struct RateLimiterActor;

impl RateLimiterActor {
    /// Spawn the actor that owns `limiter` and return a handle to it.
    pub fn spawn(buffer_size: usize, limiter: RateLimiter) -> RateLimiterHandle {
        let (tx, rx) = mpsc::channel(buffer_size);
        tokio::spawn(run_actor(rx, limiter));
        RateLimiterHandle { tx }
    }
}

async fn run_actor(mut rx: mpsc::Receiver<RateLimiterMessage>, mut limiter: RateLimiter) {
    while let Some(msg) = rx.recv().await {
        match msg {
            RateLimiterMessage::Admit {
                client_id,
                response_tx,
            } => {
                // Ignore send errors - the requesting connection may be gone
                let _ = response_tx.send(limiter.admit(&client_id));
            }
        }
    }

    tracing::debug!("rate limiter actor shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn concurrent_submissions_from_one_client_admit_exactly_once() {
        let handle = RateLimiterActor::spawn(64, RateLimiter::new(Duration::from_secs(60)));

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let handle = handle.clone();
            tasks.push(tokio::spawn(async move {
                handle.admit("203.0.113.7".to_string()).await.unwrap()
            }));
        }

        let mut admitted = 0;
        for task in tasks {
            if task.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 1);
    }

    #[tokio::test]
    async fn distinct_clients_do_not_contend() {
        let handle = RateLimiterActor::spawn(64, RateLimiter::new(Duration::from_secs(60)));

        assert!(handle.admit("203.0.113.7".to_string()).await.unwrap());
        assert!(handle.admit("203.0.113.8".to_string()).await.unwrap());
        assert!(!handle.admit("203.0.113.7".to_string()).await.unwrap());
    }
}

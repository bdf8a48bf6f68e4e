//! Minimum-interval admission policy
//!
//! Tracks the last accepted submission per client identity and rejects
//! anything that arrives again within the configured window. The policy is
//! synchronous and single-owner; shared access across connection tasks goes
//! through the actor in [`crate::actor`].

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Per-client admission policy: at most one accepted submission per window.
///
/// Entries are never evicted; the map grows with the number of distinct
/// clients seen over the process lifetime.
pub struct RateLimiter {
    window: Duration,
    last_admitted: HashMap<String, Instant>,
}

impl RateLimiter {
    /// Create a policy admitting one submission per `window` per client.
    ///
    /// A zero window disables rate limiting entirely.
    pub fn new(window: Duration) -> Self {
        RateLimiter {
            window,
            last_admitted: HashMap::new(),
        }
    }

    /// Check and record an admission for `client_id` at the current time.
    pub fn admit(&mut self, client_id: &str) -> bool {
        self.admit_at(client_id, Instant::now())
    }

    /// Check and record an admission for `client_id` at `now`.
    ///
    /// Admits on first sighting, or once a full window has elapsed since
    /// the last admission. A rejection leaves the recorded time untouched:
    /// a client hammering the server becomes eligible one window after its
    /// last accepted submission, not its last attempt.
    pub fn admit_at(&mut self, client_id: &str, now: Instant) -> bool {
        if self.window.is_zero() {
            return true;
        }

        if let Some(last) = self.last_admitted.get(client_id) {
            if now.duration_since(*last) < self.window {
                return false;
            }
        }

        self.last_admitted.insert(client_id.to_string(), now);
        true
    }
}

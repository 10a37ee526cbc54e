//! Minimum inter-request delay, enforced process-wide
//!
//! Every request path calls [`RateLimiter::await_turn`] before touching the
//! network. One shared clock covers all callers; the lock is held across the
//! sleep so concurrent callers are serialized and the configured gap applies
//! globally, not per task.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

/// Enforces a minimum wall-clock gap between consecutive outbound requests.
///
/// Callers queue on a single async mutex guarding the time of the last
/// request; ordering is lock-acquisition order. Starvation under very high
/// concurrency is possible and accepted.
#[derive(Debug)]
pub struct RateLimiter {
    delay: Duration,
    last_turn: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a rate limiter with the given minimum gap between requests.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_turn: Mutex::new(None),
        }
    }

    /// The configured minimum gap.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait until at least `delay` has elapsed since the previous caller's
    /// turn, then claim the current instant as the new reference point.
    pub async fn await_turn(&self) {
        let mut last = self.last_turn.lock().await;

        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.delay {
                sleep(self.delay - elapsed).await;
            }
        }

        *last = Some(Instant::now());
    }
}

//! Circuit breaker for rate-limit (429) protection
//!
//! Tracks consecutive throttling failures across all request paths. When the
//! failure count reaches the threshold the breaker opens: requests are held
//! back until the cooldown elapses, and the advertised concurrency ceiling is
//! halved. The reduction is monotonic within a run; only [`CircuitBreaker::reset`]
//! restores the original ceiling.

use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Factor applied to the concurrency ceiling on each trip.
const CONCURRENCY_REDUCTION_FACTOR: f64 = 0.5;

/// Point-in-time view of the breaker, taken under the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitSnapshot {
    /// Consecutive failures recorded since the last success
    pub consecutive_failures: u32,
    /// Whether the breaker is currently open
    pub is_open: bool,
    /// Current concurrency ceiling
    pub current_concurrency: usize,
    /// Ceiling the breaker started the run with
    pub original_concurrency: usize,
}

#[derive(Debug)]
struct CircuitState {
    consecutive_failures: u32,
    is_open: bool,
    last_failure: Option<Instant>,
    current_concurrency: usize,
}

/// Failure-triggered gate guarding the request path.
///
/// Every read and write goes through one exclusive lock, held only for the
/// state update itself; no I/O or sleeping happens under the lock.
#[derive(Debug)]
pub struct CircuitBreaker {
    state: Mutex<CircuitState>,
    failure_threshold: u32,
    cooldown: Duration,
    original_concurrency: usize,
}

impl CircuitBreaker {
    /// Create a breaker with the given trip threshold, cooldown window, and
    /// initial concurrency ceiling.
    pub fn new(failure_threshold: u32, cooldown: Duration, concurrency: usize) -> Self {
        Self {
            state: Mutex::new(CircuitState {
                consecutive_failures: 0,
                is_open: false,
                last_failure: None,
                current_concurrency: concurrency.max(1),
            }),
            failure_threshold,
            cooldown,
            original_concurrency: concurrency.max(1),
        }
    }

    /// The configured cooldown window.
    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Record a successful request: failure count resets, breaker closes.
    pub fn record_success(&self) {
        let mut state = self.lock();
        state.consecutive_failures = 0;
        state.is_open = false;
    }

    /// Record a throttled request (HTTP 429).
    ///
    /// The failure timestamp is stamped on every call; the breaker opens
    /// only once the consecutive count reaches the threshold. Returns true
    /// when this call tripped the breaker.
    pub fn record_failure(&self) -> bool {
        let mut state = self.lock();
        state.consecutive_failures += 1;
        state.last_failure = Some(Instant::now());

        if state.consecutive_failures >= self.failure_threshold {
            state.is_open = true;
            warn!(
                consecutive_failures = state.consecutive_failures,
                threshold = self.failure_threshold,
                "Circuit breaker tripped"
            );
            return true;
        }
        false
    }

    /// Whether a request may proceed.
    ///
    /// While open, the first check at or after `last_failure + cooldown`
    /// closes the breaker (zeroing the failure count) and lets one request
    /// through; its outcome decides whether the breaker re-opens.
    pub fn should_allow(&self) -> bool {
        let mut state = self.lock();
        if !state.is_open {
            return true;
        }

        let elapsed = state
            .last_failure
            .map(|t| t.elapsed())
            .unwrap_or(self.cooldown);
        if elapsed >= self.cooldown {
            debug!("Circuit breaker cooldown elapsed, closing");
            state.is_open = false;
            state.consecutive_failures = 0;
            return true;
        }

        false
    }

    /// Time left until the open breaker would admit a request, if open.
    pub fn remaining_cooldown(&self) -> Option<Duration> {
        let state = self.lock();
        if !state.is_open {
            return None;
        }
        let elapsed = state.last_failure.map(|t| t.elapsed())?;
        Some(self.cooldown.saturating_sub(elapsed))
    }

    /// Lower the concurrency ceiling after a trip.
    ///
    /// The new ceiling is `max(1, floor(current * factor))` and persists
    /// until [`CircuitBreaker::reset`]; it never recovers on its own.
    pub fn reduce_concurrency(&self) -> usize {
        let mut state = self.lock();
        let old = state.current_concurrency;
        let reduced = (old as f64 * CONCURRENCY_REDUCTION_FACTOR) as usize;
        state.current_concurrency = reduced.max(1);
        warn!(
            old_concurrency = old,
            new_concurrency = state.current_concurrency,
            cooldown_secs = self.cooldown.as_secs_f64(),
            "Rate limited; reducing concurrency"
        );
        state.current_concurrency
    }

    /// Current concurrency ceiling.
    pub fn get_concurrency(&self) -> usize {
        self.lock().current_concurrency
    }

    /// Consecutive failures recorded since the last success.
    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }

    /// Restore the breaker to its initial state, including the original
    /// concurrency ceiling.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.consecutive_failures = 0;
        state.is_open = false;
        state.current_concurrency = self.original_concurrency;
    }

    /// Snapshot the breaker state for diagnostics.
    pub fn snapshot(&self) -> CircuitSnapshot {
        let state = self.lock();
        CircuitSnapshot {
            consecutive_failures: state.consecutive_failures,
            is_open: state.is_open,
            current_concurrency: state.current_concurrency,
            original_concurrency: self.original_concurrency,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CircuitState> {
        // A poisoned lock means a panic mid-update; the state is a handful
        // of scalars, so continuing with the last written values is sound.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

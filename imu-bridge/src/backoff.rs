//! Reconnect backoff.

use std::time::Duration;

/// Delay before the first reconnect attempt, and after every successful open.
pub const INITIAL_DELAY_MS: u64 = 1000;

/// Upper bound on the reconnect delay.
pub const MAX_DELAY_MS: u64 = 60_000;

/// Exponential reconnect delay, growing by 1.5x per failure.
///
/// Delays are whole milliseconds; the fractional half-millisecond produced
/// by odd values is truncated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    delay_ms: u64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            delay_ms: INITIAL_DELAY_MS,
        }
    }
}

impl Backoff {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current delay in milliseconds.
    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    /// Record a failed or closed attempt and return the delay to wait
    /// before the next one.
    pub fn fail(&mut self) -> Duration {
        self.delay_ms = (self.delay_ms * 3 / 2).min(MAX_DELAY_MS);
        Duration::from_millis(self.delay_ms)
    }

    /// Record a successful open.
    pub fn reset(&mut self) {
        self.delay_ms = INITIAL_DELAY_MS;
    }
}

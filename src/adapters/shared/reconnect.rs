//! Shared reconnection policy
//!
//! `RetryPolicy` is a small value object: a fixed delay, a maximum number
//! of attempts, and a counter. A successful connection resets it; an
//! exhausted policy means the adapter stays disconnected.

use std::time::Duration;

use crate::config::ReconnectConfig;

/// Fixed-delay bounded retry policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    delay: Duration,
    max_attempts: u32,
    attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&ReconnectConfig::default())
    }
}

impl From<&ReconnectConfig> for RetryPolicy {
    fn from(config: &ReconnectConfig) -> Self {
        Self::new(Duration::from_millis(config.delay_ms), config.max_attempts)
    }
}

impl RetryPolicy {
    pub fn new(delay: Duration, max_attempts: u32) -> Self {
        Self {
            delay,
            max_attempts,
            attempts: 0,
        }
    }

    /// Consume one attempt. `None` once the budget is spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }
        self.attempts += 1;
        Some(self.delay)
    }

    /// Restore the full budget after a successful connection
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }
}

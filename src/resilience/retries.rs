//! Retry policy for upstream fetches.
//!
//! Only network-level failures before any response arrived are retried
//! (connect errors and timeouts). An upstream status, including 5xx, is an
//! answer and is relayed as-is.

use std::time::Duration;

use crate::config::RetryConfig;
use crate::resilience::backoff::calculate_backoff;

/// Whether a failed attempt may be repeated.
pub trait Retryable {
    fn is_transient(&self) -> bool;
}

impl Retryable for reqwest::Error {
    fn is_transient(&self) -> bool {
        self.is_connect() || self.is_timeout()
    }
}

/// Bounded retry schedule derived from [`RetryConfig`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay_ms: u64,
    max_delay_ms: u64,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        let max_attempts = if config.enabled {
            config.max_attempts.max(1)
        } else {
            1
        };
        Self {
            max_attempts,
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 0,
            max_delay_ms: 0,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the delay to wait before the next attempt, or `None` to give up.
    /// `attempt` is the number of attempts already made.
    pub fn next_delay<E: Retryable>(&self, attempt: u32, error: &E) -> Option<Duration> {
        if attempt >= self.max_attempts || !error.is_transient() {
            return None;
        }
        Some(calculate_backoff(attempt, self.base_delay_ms, self.max_delay_ms))
    }
}

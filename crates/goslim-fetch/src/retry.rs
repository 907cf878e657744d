//! Retry policy for upstream downloads.
//!
//! Mirrors are fetched from public services that occasionally answer with
//! 5xx or 429 during maintenance windows. Those resolve on their own, so
//! the fetcher retries with exponential backoff before giving up.

use std::time::Duration;

use crate::FetchError;

/// Configuration for retry behavior on transient fetch errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial one).
    pub max_attempts: u32,
    /// Initial delay before the first retry.
    pub base_delay: Duration,
    /// Maximum delay between retries (backoff is capped here).
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    /// Delay before the attempt following `attempt` (1-based).
    ///
    /// `base * 2^(attempt - 1)`, capped at `max_delay`.
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1_u32 << exp)
            .min(self.max_delay)
    }

    /// Delay to wait after `err` on `attempt`, or `None` when the error is
    /// permanent or attempts are exhausted.
    ///
    /// A `Retry-After` hint raises the delay, still within `max_delay`.
    #[must_use]
    pub fn delay_after(&self, err: &FetchError, attempt: u32) -> Option<Duration> {
        if !err.is_transient() || attempt >= self.max_attempts {
            return None;
        }
        let mut delay = self.backoff(attempt);
        if let FetchError::RateLimited {
            retry_after_secs, ..
        } = err
        {
            delay = delay.max(Duration::from_secs(*retry_after_secs).min(self.max_delay));
        }
        Some(delay)
    }
}

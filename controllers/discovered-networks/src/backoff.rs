//! # Fibonacci Backoff
//!
//! Provides a Fibonacci-based backoff and a bounded retry policy for WAPI
//! requests. Only transient failures are retried; authentication and
//! protocol failures are returned on the first occurrence.
//!
//! Default sequence: 250ms, 250ms, 500ms, 750ms, 1.25s, 2s, 3.25s, 5s (max).

use std::future::Future;
use std::time::Duration;
use tracing::warn;
use wapi_client::WapiError;

/// Fibonacci backoff calculator
///
/// Each backoff is the sum of the previous two backoffs, capped at `max`.
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    /// Previous backoff value
    prev: Duration,
    /// Current backoff value
    current: Duration,
    /// Maximum backoff value
    max: Duration,
}

impl FibonacciBackoff {
    /// Create a new Fibonacci backoff with specified minimum and maximum values
    ///
    /// # Arguments
    ///
    /// * `min` - Minimum backoff duration (used for the first two values)
    /// * `max` - Maximum backoff duration (caps the sequence)
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            prev: Duration::ZERO,
            current: min,
            max,
        }
    }

    /// Get the next backoff duration and advance the sequence
    pub fn next_backoff(&mut self) -> Duration {
        let result = self.current;

        let next = self.prev + self.current;
        self.prev = self.current;
        self.current = std::cmp::min(next, self.max);

        result
    }
}

/// Bounded retry policy for transient failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub min_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Retry without waiting between attempts
    #[must_use]
    #[cfg_attr(not(test), allow(dead_code, reason = "used by tests"))]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            min_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Start tracking attempts for one operation
    pub fn start(&self) -> RetryState<'_> {
        RetryState {
            policy: self,
            attempt: 1,
            backoff: FibonacciBackoff::new(self.min_backoff, self.max_backoff),
        }
    }
}

/// Attempt counter for one operation under a [`RetryPolicy`]
#[derive(Debug)]
pub struct RetryState<'a> {
    policy: &'a RetryPolicy,
    attempt: u32,
    backoff: FibonacciBackoff,
}

impl RetryState<'_> {
    /// Sleep before the next attempt if `err` is retryable, otherwise return it
    pub async fn backoff_or_fail(&mut self, err: WapiError, what: &str) -> Result<(), WapiError> {
        if !err.is_transient() || self.attempt >= self.policy.max_attempts {
            return Err(err);
        }

        let delay = self.backoff.next_backoff();
        warn!(
            "{} failed (attempt {}/{}): {}; retrying in {:?}",
            what, self.attempt, self.policy.max_attempts, err, delay
        );
        tokio::time::sleep(delay).await;
        self.attempt += 1;
        Ok(())
    }
}

/// Run `op` until it succeeds, fails permanently, or the policy is exhausted
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, what: &str, mut op: F) -> Result<T, WapiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, WapiError>>,
{
    let mut state = policy.start();
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => state.backoff_or_fail(e, what).await?,
        }
    }
}

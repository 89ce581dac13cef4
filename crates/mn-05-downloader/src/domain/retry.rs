//! # Retry Policy
//!
//! Timeout plus capped exponential backoff around a fallible async call.
//! Only errors classified transient are retried.

use crate::config::RetryConfig;
use crate::domain::errors::{CheckpointError, StorageError};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::debug;

/// Errors a `RetryPolicy` can drive.
pub trait Retryable: std::error::Error {
    /// True if the same call may succeed later.
    fn is_transient(&self) -> bool;

    /// The error to report when an attempt exceeds its timeout.
    fn timed_out(after: Duration) -> Self;
}

impl Retryable for StorageError {
    fn is_transient(&self) -> bool {
        StorageError::is_transient(self)
    }

    fn timed_out(after: Duration) -> Self {
        StorageError::Timeout(after)
    }
}

impl Retryable for CheckpointError {
    fn is_transient(&self) -> bool {
        matches!(self, CheckpointError::Io(_) | CheckpointError::Timeout(_))
    }

    fn timed_out(after: Duration) -> Self {
        CheckpointError::Timeout(after)
    }
}

/// Retry policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
    timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// Build from configuration.
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            attempts: config.attempts.max(1),
            initial_backoff: config.initial_backoff(),
            max_backoff: config.max_backoff(),
            timeout: config.timeout(),
        }
    }

    /// Attempts per call.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay after failed attempt number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1u32 << exponent)
            .min(self.max_backoff)
    }

    /// Run `call` until it succeeds, fails permanently or attempts run out.
    pub async fn run<T, E, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, E>
    where
        E: Retryable,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut attempt = 1;
        loop {
            let result = match timeout(self.timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(E::timed_out(self.timeout)),
            };
            match result {
                Err(e) if e.is_transient() && attempt < self.attempts => {
                    let delay = self.backoff(attempt);
                    debug!(operation, attempt, ?delay, error = %e, "[mn-05] Transient failure, retrying");
                    sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

//! Exponential backoff for rate-limited calls

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use super::BayesError;

/// Retry policy with exponential backoff
///
/// Only errors for which [`BayesError::is_retryable`] holds are retried. The delay
/// doubles with every attempt until it reaches `max_backoff`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one; `None` retries forever
    pub max_attempts: Option<u32>,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Some(8),
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    pub fn new(
        max_attempts: Option<u32>,
        initial_backoff: Duration,
        max_backoff: Duration,
    ) -> Self {
        Self {
            max_attempts,
            initial_backoff,
            max_backoff: max_backoff.max(initial_backoff),
        }
    }

    /// Retries rate limiting without an attempt cap
    pub fn unbounded() -> Self {
        Self {
            max_attempts: None,
            ..Self::default()
        }
    }

    /// A single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_attempts: Some(1),
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (0-based)
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.min(31));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    fn attempts_exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }

    /// Runs `operation` until it succeeds, fails permanently or runs out of attempts
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, BayesError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, BayesError>>,
    {
        let mut attempts = 0;

        loop {
            match operation().await {
                Ok(result) => {
                    if attempts > 0 {
                        tracing::debug!("Call succeeded after {} retries", attempts);
                    }
                    return Ok(result);
                }
                Err(err) if err.is_retryable() => {
                    attempts += 1;
                    if self.attempts_exhausted(attempts) {
                        tracing::warn!("Giving up after {} attempts: {}", attempts, err);
                        return Err(err);
                    }

                    let backoff = self.backoff_for(attempts - 1);
                    tracing::info!("{}; retrying in {:?}", err, backoff);
                    sleep(backoff).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

//! Retry with exponential backoff for provider calls
//!
//! Transient failures (rate limits, 5xx responses, network errors) are
//! retried up to a fixed attempt count. Non-retryable errors surface
//! immediately.

use std::future::Future;
use std::time::Duration;

use log::warn;

use super::client::LlmError;

/// Backoff policy for completion calls
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(4),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based): base * 2^(attempt-1),
    /// capped at max_delay
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        let delay = self.base_delay.saturating_mul(factor);
        delay.min(self.max_delay)
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// exhausts the policy's attempts. Rate-limit errors wait at least as long
/// as the server asked for.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < policy.max_attempts => {
                let mut delay = policy.delay_for_attempt(attempt);
                if let LlmError::RateLimited { retry_after } = &err {
                    delay = delay.max(*retry_after);
                }
                warn!(
                    "completion attempt {}/{} failed ({}), retrying in {:?}",
                    attempt, policy.max_attempts, err, delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

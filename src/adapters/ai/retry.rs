//! Exponential backoff for transient provider errors.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use crate::ports::AIError;

/// Retry schedule shared by the HTTP providers.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_secs(1),
        }
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Delay before retry number `retry_count` (0-based): 1x, 2x, 4x, ...
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        self.base_delay * (1u32 << retry_count.min(16))
    }

    /// Runs `attempt` until it succeeds, fails with a non-retryable error,
    /// or the retries are used up.
    pub async fn run<T, F, Fut>(&self, provider: &str, mut attempt: F) -> Result<T, AIError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AIError>>,
    {
        let mut retry_count = 0;
        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_retryable() || retry_count >= self.max_retries => return Err(err),
                Err(err) => {
                    let delay = self.delay_for(retry_count);
                    warn!(provider, error = %err, retry = retry_count + 1, delay_ms = delay.as_millis() as u64, "Retrying AI request");
                    sleep(delay).await;
                    retry_count += 1;
                }
            }
        }
    }
}

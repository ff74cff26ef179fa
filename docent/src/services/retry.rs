use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::error::{DocentError, Result};

/// Bounded exponential backoff around one external call.
///
/// Each attempt runs under its own timeout. The delay starts at
/// `initial_delay` and doubles up to `max_delay`. Errors that are not
/// retryable end the loop at once.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
    call_timeout: Duration,
}

impl RetryPolicy {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms.max(config.initial_delay_ms)),
            call_timeout: Duration::from_secs(config.call_timeout_secs.max(1)),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before attempt `attempt + 1`, where `attempt` is 1-based.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Runs `op` until it succeeds, fails with a non-retryable error, or the
    /// attempts run out. Exhaustion yields `ExternalService`.
    pub async fn run<T, F, Fut>(&self, service: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            attempt += 1;

            let outcome = match tokio::time::timeout(self.call_timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(DocentError::Timeout(
                    u64::try_from(self.call_timeout.as_millis()).unwrap_or(u64::MAX),
                )),
            };

            let error = match outcome {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            if !error.is_retryable() || attempt >= self.max_attempts {
                tracing::error!(
                    service,
                    attempt,
                    error = %error,
                    "External call failed"
                );
                return Err(DocentError::ExternalService {
                    service: service.to_string(),
                    attempts: attempt,
                    message: error.to_string(),
                });
            }

            let delay = match &error {
                DocentError::ApiRateLimit {
                    retry_after: Some(secs),
                } => Duration::from_secs(*secs).min(self.max_delay),
                _ => self.delay_after(attempt),
            };
            tracing::warn!(
                service,
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %error,
                "External call failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

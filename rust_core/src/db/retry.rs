//! Retry with exponential backoff for transient database failures

use crate::config::env_parse;
use crate::error::Result;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            max_attempts: env_parse::<u32>("DB_RETRY_MAX_ATTEMPTS")
                .unwrap_or(d.max_attempts)
                .max(1),
            base_backoff: env_parse("DB_RETRY_BASE_BACKOFF_MS")
                .map(Duration::from_millis)
                .unwrap_or(d.base_backoff),
            max_backoff: env_parse("DB_RETRY_MAX_BACKOFF_MS")
                .map(Duration::from_millis)
                .unwrap_or(d.max_backoff),
        }
    }

    /// No retries, for tests and one-shot tools
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }

    /// Backoff before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

/// Run `f` until it succeeds, fails with a non-transient error, or the
/// policy's attempts are used up
pub async fn execute_with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    operation: &str,
    mut f: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if attempt < policy.max_attempts && e.is_transient() => {
                let backoff = policy.backoff(attempt);
                warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {:?}",
                    operation, attempt, policy.max_attempts, e, backoff
                );
                tokio::time::sleep(backoff).await;
            }
            Err(e) => return Err(e),
        }
    }
}

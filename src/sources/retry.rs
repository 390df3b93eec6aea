//! Exponential backoff for remote calls

use crate::config::schema::RetryConfig;
use crate::error::SourceError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry policy applied at source call sites
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            multiplier: config.multiplier.max(1.0),
        }
    }

    /// A policy that never retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (0-based).
    ///
    /// Exponential backoff capped at `max_delay`; a server-provided
    /// `Retry-After` hint is honored when it is longer.
    pub fn delay_for(&self, attempt: u32, err: &SourceError) -> Duration {
        let factor = self.multiplier.powi(attempt.min(32) as i32);
        let secs = (self.base_delay.as_secs_f64() * factor).min(self.max_delay.as_secs_f64());
        let backoff = Duration::from_secs_f64(secs);
        match err.retry_after() {
            Some(hint) => hint.max(backoff),
            None => backoff,
        }
    }

    /// Run `op`, retrying retryable failures
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, SourceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    let delay = self.delay_for(attempt, &err);
                    warn!(
                        what,
                        error = %err,
                        attempt = attempt + 1,
                        max = self.max_retries,
                        "Retrying in {:.1}s",
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

//! Retry configuration, delay calculation, and the retrying oracle decorator.
//!
//! The cache itself never retries. Retrying is an oracle-client concern and
//! is opt-in: wrap any [`PricingOracle`] in a [`RetryingOracle`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::{OracleRate, PricingOracle};
use crate::telemetry;
use crate::types::Identifier;
use crate::{MuninnError, Result};

/// Configuration for retry behaviour on transient errors.
///
/// Uses exponential backoff capped at `max_delay`:
///
/// ```rust
/// # use muninn::oracle::RetryConfig;
/// # use std::time::Duration;
/// let config = RetryConfig::new()
///     .max_attempts(5)
///     .initial_delay(Duration::from_millis(200));
/// assert_eq!(config.delay_for_attempt(1), Duration::from_millis(400));
/// ```
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial request).
    /// 1 = no retry. Default: 3.
    pub max_attempts: u32,
    /// Base delay before the first retry. Default: 500ms.
    pub initial_delay: Duration,
    /// Maximum delay between retries (caps exponential growth). Default: 10s.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    /// Create a new config with sensible defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config that disables retries (single attempt).
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Set maximum attempts (including the initial request).
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    /// Set the base delay before the first retry.
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the maximum delay between retries.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Delay before retry number `attempt` (0-indexed):
    /// `initial_delay * 2^attempt`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self
            .initial_delay
            .saturating_mul(2u32.saturating_pow(attempt));
        delay.min(self.max_delay)
    }

    /// Like [`delay_for_attempt()`](Self::delay_for_attempt), but a
    /// server-provided `retry_after` hint takes precedence.
    pub fn effective_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        retry_after.unwrap_or_else(|| self.delay_for_attempt(attempt))
    }
}

/// Decorator that wraps a [`PricingOracle`] with retry logic.
///
/// Transient errors (see [`MuninnError::is_transient()`]) are retried up to
/// `config.max_attempts`; anything else, including a response that decodes
/// but misses identifiers, is returned immediately.
pub struct RetryingOracle {
    inner: Arc<dyn PricingOracle>,
    config: RetryConfig,
}

impl RetryingOracle {
    /// Wrap an oracle with retry logic.
    pub fn new(inner: Arc<dyn PricingOracle>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl PricingOracle for RetryingOracle {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch(&self, identifiers: &[Identifier]) -> Result<Vec<OracleRate>> {
        let mut last_err = None;
        for attempt in 0..self.config.max_attempts.max(1) {
            match self.inner.fetch(identifiers).await {
                Ok(rates) => return Ok(rates),
                Err(e) if e.is_transient() => {
                    if attempt + 1 < self.config.max_attempts {
                        metrics::counter!(telemetry::ORACLE_RETRIES_TOTAL,
                            "oracle" => self.inner.name().to_owned(),
                        )
                        .increment(1);
                        let delay = self.config.effective_delay(attempt, e.retry_after());
                        warn!(
                            oracle = self.inner.name(),
                            attempt = attempt + 1,
                            max_attempts = self.config.max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "retrying after transient error"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or_else(|| MuninnError::Http("no oracle attempt made".into())))
    }
}

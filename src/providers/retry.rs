//! Retry configuration, delay calculation, and collaborator decorators.
//!
//! Provides [`RetryConfig`] for controlling retry behaviour and
//! `Retrying*` decorators that wrap the classifier and places traits with
//! automatic retry on transient errors. Geolocation is never retried:
//! its failures are permission or capability problems.
//!
//! The workflow itself never retries. Retrying here is opt-in and
//! disabled by default ([`RetryConfig::disabled()`]).

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::traits::{Classifier, PlacesSearch};
use crate::telemetry;
use crate::types::{BinQuery, ImageUpload, NearbyBin, WasteLabel};
use crate::{Result, WasteMapError};

/// Configuration for retry behaviour on transient errors.
///
/// Uses exponential backoff:
///
/// ```rust
/// # use wastemap::RetryConfig;
/// # use std::time::Duration;
/// let config = RetryConfig::new()
///     .max_attempts(5)
///     .initial_delay(Duration::from_millis(200));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the initial request).
    /// 1 = no retry. Default: 3.
    pub max_attempts: u32,
    /// Base delay before the first retry. Default: 500ms.
    pub initial_delay: Duration,
    /// Maximum delay between retries (caps exponential growth). Default: 30s.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
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

    pub fn is_enabled(&self) -> bool {
        self.max_attempts > 1
    }

    /// Set maximum attempts (including the initial request).
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n;
        self
    }

    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Delay for a given attempt number (0-indexed):
    /// `initial_delay * 2^attempt`, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self
            .initial_delay
            .saturating_mul(2u32.saturating_pow(attempt));
        delay.min(self.max_delay)
    }

    /// A server `retry_after` hint takes precedence over the backoff.
    pub fn effective_delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        retry_after
            .unwrap_or_else(|| self.delay_for_attempt(attempt))
            .min(self.max_delay)
    }
}

// ============================================================================
// Shared retry helper
// ============================================================================

/// Execute an async operation, retrying transient errors up to
/// `config.max_attempts`. Permanent errors return immediately.
pub(crate) async fn with_retry<F, Fut, T>(config: &RetryConfig, service: &str, f: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = config.max_attempts.max(1);
    let mut last_err = None;
    for attempt in 0..attempts {
        match f().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_transient() => {
                if attempt + 1 < attempts {
                    metrics::counter!(telemetry::RETRIES_TOTAL, "service" => service.to_owned())
                        .increment(1);
                    let delay = config.effective_delay(attempt, e.retry_after());
                    warn!(
                        service,
                        attempt = attempt + 1,
                        max_attempts = attempts,
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
    Err(last_err.unwrap_or_else(|| WasteMapError::Http("retry loop made no attempt".to_string())))
}

// ============================================================================
// RetryingClassifier
// ============================================================================

/// Decorator that wraps a [`Classifier`] with retry logic.
pub struct RetryingClassifier {
    inner: Arc<dyn Classifier>,
    config: RetryConfig,
}

impl RetryingClassifier {
    pub fn new(inner: Arc<dyn Classifier>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl Classifier for RetryingClassifier {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn classify(&self, image: &ImageUpload) -> Result<WasteLabel> {
        with_retry(&self.config, self.inner.name(), || self.inner.classify(image)).await
    }
}

// ============================================================================
// RetryingPlacesSearch
// ============================================================================

/// Decorator that wraps a [`PlacesSearch`] with retry logic.
///
/// Same semantics as [`RetryingClassifier`].
pub struct RetryingPlacesSearch {
    inner: Arc<dyn PlacesSearch>,
    config: RetryConfig,
}

impl RetryingPlacesSearch {
    pub fn new(inner: Arc<dyn PlacesSearch>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl PlacesSearch for RetryingPlacesSearch {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn search(&self, query: &BinQuery) -> Result<Vec<NearbyBin>> {
        with_retry(&self.config, self.inner.name(), || self.inner.search(query)).await
    }
}

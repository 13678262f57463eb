use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use wastemap::providers::retry::{RetryConfig, RetryingClassifier, RetryingPlacesSearch};
use wastemap::providers::traits::{Classifier, PlacesSearch};
use wastemap::{
    BinQuery, Coordinates, ImageUpload, NearbyBin, Result, WasteLabel, WasteMapError,
};

/// Mock collaborator that fails N times then succeeds.
struct FailThenSucceed {
    fail_count: AtomicU32,
    fail_with: fn() -> WasteMapError,
    total_calls: AtomicU32,
}

impl FailThenSucceed {
    fn new(failures: u32, fail_with: fn() -> WasteMapError) -> Self {
        Self {
            fail_count: AtomicU32::new(failures),
            fail_with,
            total_calls: AtomicU32::new(0),
        }
    }

    fn call_count(&self) -> u32 {
        self.total_calls.load(Ordering::Relaxed)
    }

    fn attempt(&self) -> Result<()> {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        let remaining = self.fail_count.load(Ordering::Relaxed);
        if remaining > 0 {
            self.fail_count.fetch_sub(1, Ordering::Relaxed);
            return Err((self.fail_with)());
        }
        Ok(())
    }
}

#[async_trait]
impl Classifier for FailThenSucceed {
    fn name(&self) -> &str {
        "mock-retry"
    }

    async fn classify(&self, _image: &ImageUpload) -> Result<WasteLabel> {
        self.attempt()?;
        WasteLabel::new("glass")
    }
}

#[async_trait]
impl PlacesSearch for FailThenSucceed {
    fn name(&self) -> &str {
        "mock-retry"
    }

    async fn search(&self, query: &BinQuery) -> Result<Vec<NearbyBin>> {
        self.attempt()?;
        Ok(vec![NearbyBin {
            kind: "Bottle Bank".into(),
            location: query.location,
        }])
    }
}

fn fast_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig::new()
        .max_attempts(max_attempts)
        .initial_delay(Duration::from_millis(1))
}

fn image() -> ImageUpload {
    ImageUpload::new("jar.jpg", b"jar".to_vec())
}

fn query() -> BinQuery {
    BinQuery {
        location: Coordinates::new(51.5, -0.12),
        category: "glass dustbins".into(),
        radius_m: 5000,
    }
}

#[tokio::test]
async fn retries_on_transient_error_then_succeeds() {
    let inner = Arc::new(FailThenSucceed::new(2, || WasteMapError::RateLimited {
        retry_after: None,
    }));
    let classifier = RetryingClassifier::new(inner.clone(), fast_retry(3));

    let label = classifier.classify(&image()).await.unwrap();
    assert_eq!(label.as_str(), "glass");
    assert_eq!(inner.call_count(), 3);
}

#[tokio::test]
async fn gives_up_after_max_attempts() {
    let inner = Arc::new(FailThenSucceed::new(10, || {
        WasteMapError::Http("connection reset".into())
    }));
    let classifier = RetryingClassifier::new(inner.clone(), fast_retry(3));

    let err = classifier.classify(&image()).await.unwrap_err();
    assert!(matches!(err, WasteMapError::Http(_)));
    assert_eq!(inner.call_count(), 3);
}

#[tokio::test]
async fn permanent_errors_are_not_retried() {
    let inner = Arc::new(FailThenSucceed::new(1, || {
        WasteMapError::AuthenticationFailed
    }));
    let classifier = RetryingClassifier::new(inner.clone(), fast_retry(5));

    let err = classifier.classify(&image()).await.unwrap_err();
    assert!(matches!(err, WasteMapError::AuthenticationFailed));
    assert_eq!(inner.call_count(), 1);
}

#[tokio::test]
async fn client_errors_are_not_retried() {
    let inner = Arc::new(FailThenSucceed::new(1, || WasteMapError::Api {
        status: 400,
        message: "bad image".into(),
    }));
    let classifier = RetryingClassifier::new(inner.clone(), fast_retry(5));

    assert!(classifier.classify(&image()).await.is_err());
    assert_eq!(inner.call_count(), 1);
}

#[tokio::test]
async fn disabled_config_makes_a_single_attempt() {
    let inner = Arc::new(FailThenSucceed::new(1, || WasteMapError::Api {
        status: 503,
        message: "unavailable".into(),
    }));
    let classifier = RetryingClassifier::new(inner.clone(), RetryConfig::disabled());

    assert!(classifier.classify(&image()).await.is_err());
    assert_eq!(inner.call_count(), 1);
}

#[tokio::test]
async fn places_search_is_retried() {
    let inner = Arc::new(FailThenSucceed::new(1, || WasteMapError::Api {
        status: 502,
        message: "bad gateway".into(),
    }));
    let places = RetryingPlacesSearch::new(inner.clone(), fast_retry(2));

    let bins = places.search(&query()).await.unwrap();
    assert_eq!(bins.len(), 1);
    assert_eq!(bins[0].location, Coordinates::new(51.5, -0.12));
    assert_eq!(inner.call_count(), 2);
    assert_eq!(places.name(), "mock-retry");
}

#[tokio::test(start_paused = true)]
async fn server_retry_after_hint_is_honoured() {
    let inner = Arc::new(FailThenSucceed::new(1, || WasteMapError::RateLimited {
        retry_after: Some(Duration::from_secs(5)),
    }));
    let classifier = RetryingClassifier::new(inner.clone(), fast_retry(2));

    let start = tokio::time::Instant::now();
    classifier.classify(&image()).await.unwrap();
    assert!(start.elapsed() >= Duration::from_secs(5));
    assert_eq!(inner.call_count(), 2);
}

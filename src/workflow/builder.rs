//! Builder for configuring workflow instances

use std::sync::Arc;
use std::time::Duration;

use super::controller::{Services, Workflow};
use crate::cache::{CacheConfig, CachingPlacesSearch};
use crate::providers::{
    AlertSink, Classifier, ClassifierClient, DEFAULT_CLASSIFIER_URL, DEFAULT_PLACES_URL,
    DEFAULT_TIMEOUT, FixedLocation, GeolocationProvider, LogAlerts, NoGeolocation, PlacesClient,
    PlacesSearch, RetryConfig, RetryingClassifier, RetryingPlacesSearch,
};
use crate::types::{Coordinates, SearchSettings};
use crate::{Result, WasteMapError};

/// Main entry point for creating workflow instances.
pub struct WasteMap;

impl WasteMap {
    pub fn builder() -> WasteMapBuilder {
        WasteMapBuilder::new()
    }
}

/// Builder for configuring workflow instances.
///
/// ```rust,no_run
/// use wastemap::{Coordinates, WasteMap};
///
/// # fn main() -> wastemap::Result<()> {
/// let workflow = WasteMap::builder()
///     .classifier_url("http://localhost:8000")
///     .places_api_key("your-maps-key")
///     .location(Coordinates::new(37.77, -122.41))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct WasteMapBuilder {
    classifier_url: String,
    classifier_timeout: Duration,
    places_url: String,
    places_key: Option<String>,
    places_timeout: Duration,
    location: Option<Coordinates>,
    settings: SearchSettings,
    retry: RetryConfig,
    cache: Option<CacheConfig>,
    classifier: Option<Arc<dyn Classifier>>,
    geolocation: Option<Arc<dyn GeolocationProvider>>,
    places: Option<Arc<dyn PlacesSearch>>,
    alerts: Option<Arc<dyn AlertSink>>,
}

impl Default for WasteMapBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WasteMapBuilder {
    pub fn new() -> Self {
        Self {
            classifier_url: DEFAULT_CLASSIFIER_URL.to_string(),
            classifier_timeout: DEFAULT_TIMEOUT,
            places_url: DEFAULT_PLACES_URL.to_string(),
            places_key: None,
            places_timeout: DEFAULT_TIMEOUT,
            location: None,
            settings: SearchSettings::default(),
            retry: RetryConfig::disabled(),
            cache: None,
            classifier: None,
            geolocation: None,
            places: None,
            alerts: None,
        }
    }

    /// Base URL of the classification service.
    pub fn classifier_url(mut self, url: impl Into<String>) -> Self {
        self.classifier_url = url.into();
        self
    }

    pub fn classifier_timeout(mut self, timeout: Duration) -> Self {
        self.classifier_timeout = timeout;
        self
    }

    /// Base URL of the places service (default: Google Maps).
    pub fn places_url(mut self, url: impl Into<String>) -> Self {
        self.places_url = url.into();
        self
    }

    /// API key for the places service. Required unless a custom
    /// [`places`](Self::places) implementation is supplied.
    pub fn places_api_key(mut self, key: impl Into<String>) -> Self {
        self.places_key = Some(key.into());
        self
    }

    pub fn places_timeout(mut self, timeout: Duration) -> Self {
        self.places_timeout = timeout;
        self
    }

    /// Report this fixed position as the user's location. Without it (or a
    /// custom [`geolocation`](Self::geolocation) provider) geolocation is
    /// treated as unsupported.
    pub fn location(mut self, position: Coordinates) -> Self {
        self.location = Some(position);
        self
    }

    pub fn search_settings(mut self, settings: SearchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Retry transient classifier and places failures (default: disabled).
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    /// Enable the places result cache.
    pub fn places_cache(mut self, config: CacheConfig) -> Self {
        self.cache = Some(config);
        self
    }

    /// Use a custom classifier instead of the HTTP client.
    pub fn classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn geolocation(mut self, provider: Arc<dyn GeolocationProvider>) -> Self {
        self.geolocation = Some(provider);
        self
    }

    /// Use a custom places search instead of the HTTP client.
    pub fn places(mut self, places: Arc<dyn PlacesSearch>) -> Self {
        self.places = Some(places);
        self
    }

    /// Where user-facing alerts go (default: the log).
    pub fn alerts(mut self, alerts: Arc<dyn AlertSink>) -> Self {
        self.alerts = Some(alerts);
        self
    }

    /// Assemble the collaborators, applying retry and cache decorators.
    pub fn build_services(&self) -> Result<Services> {
        let classifier: Arc<dyn Classifier> = match &self.classifier {
            Some(classifier) => Arc::clone(classifier),
            None => Arc::new(ClassifierClient::with_timeout(
                self.classifier_url.clone(),
                self.classifier_timeout,
            )?),
        };
        let classifier: Arc<dyn Classifier> = if self.retry.is_enabled() {
            Arc::new(RetryingClassifier::new(classifier, self.retry.clone()))
        } else {
            classifier
        };

        let geolocation: Arc<dyn GeolocationProvider> = match (&self.geolocation, self.location) {
            (Some(provider), _) => Arc::clone(provider),
            (None, Some(position)) => Arc::new(FixedLocation::new(position)?),
            (None, None) => Arc::new(NoGeolocation),
        };

        let places: Arc<dyn PlacesSearch> = match (&self.places, &self.places_key) {
            (Some(places), _) => Arc::clone(places),
            (None, Some(key)) => Arc::new(PlacesClient::with_options(
                key.clone(),
                self.places_url.clone(),
                self.places_timeout,
            )?),
            (None, None) => {
                return Err(WasteMapError::Configuration(
                    "no places API key configured; set GOOGLE_MAPS_API_KEY or add it to secrets.toml"
                        .to_string(),
                ));
            }
        };
        let places: Arc<dyn PlacesSearch> = if self.retry.is_enabled() {
            Arc::new(RetryingPlacesSearch::new(places, self.retry.clone()))
        } else {
            places
        };
        let places: Arc<dyn PlacesSearch> = match &self.cache {
            Some(config) => Arc::new(CachingPlacesSearch::new(places, config)),
            None => places,
        };

        let alerts = self
            .alerts
            .clone()
            .unwrap_or_else(|| Arc::new(LogAlerts) as Arc<dyn AlertSink>);

        Ok(Services {
            classifier,
            geolocation,
            places,
            alerts,
        })
    }

    pub fn build(self) -> Result<Workflow> {
        if self.settings.radius_m == 0 {
            return Err(WasteMapError::Configuration(
                "search radius must be greater than zero".to_string(),
            ));
        }
        let services = self.build_services()?;
        Ok(Workflow::new(services, self.settings))
    }
}

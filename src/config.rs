//! Configuration loading.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.wastemap/config.toml` (user)
//! 3. `/etc/wastemap/config.toml` (system)
//!
//! Every setting has a default, so a missing file (without an explicit
//! path) yields [`Config::default()`].
//!
//! Secrets are loaded separately with mandatory permission checks:
//! 1. `~/.wastemap/secrets.toml` (user, must be 0600)
//! 2. `/etc/wastemap/secrets.toml` (system, must be 0600)
//!
//! falling back to the `GOOGLE_MAPS_API_KEY` environment variable.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::CacheConfig;
use crate::providers::{DEFAULT_CLASSIFIER_URL, DEFAULT_PLACES_URL, RetryConfig};
use crate::types::{Coordinates, DEFAULT_CATEGORY_SUFFIX, DEFAULT_SEARCH_RADIUS_M, SearchSettings};
use crate::workflow::WasteMapBuilder;
use crate::{Result, WasteMapError};

/// Environment variable holding the places API key.
pub const PLACES_KEY_ENV: &str = "GOOGLE_MAPS_API_KEY";

const CONFIG_DIR: &str = ".wastemap";
const SYSTEM_CONFIG_DIR: &str = "/etc/wastemap";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub places: PlacesConfig,
    /// Fixed user position. Absent means geolocation is unavailable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationConfig>,
    #[serde(default)]
    pub retry: RetrySection,
    #[serde(default)]
    pub cache: CacheSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Classifier base URL (default: http://localhost:8000).
    #[serde(default = "default_classifier_url")]
    pub base_url: String,
    /// Request timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            base_url: default_classifier_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_classifier_url() -> String {
    DEFAULT_CLASSIFIER_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacesConfig {
    /// Places API base URL (default: https://maps.googleapis.com).
    #[serde(default = "default_places_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Search radius in metres (default: 5000).
    #[serde(default = "default_radius")]
    pub radius_m: u32,
    /// Appended to the label to form the search category (default: " dustbins").
    #[serde(default = "default_suffix")]
    pub category_suffix: String,
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            base_url: default_places_url(),
            timeout_secs: default_timeout(),
            radius_m: default_radius(),
            category_suffix: default_suffix(),
        }
    }
}

fn default_places_url() -> String {
    DEFAULT_PLACES_URL.to_string()
}

fn default_radius() -> u32 {
    DEFAULT_SEARCH_RADIUS_M
}

fn default_suffix() -> String {
    DEFAULT_CATEGORY_SUFFIX.to_string()
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<LocationConfig> for Coordinates {
    fn from(l: LocationConfig) -> Self {
        Coordinates::new(l.latitude, l.longitude)
    }
}

/// Retry settings. Default is a single attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySection {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    1
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000
}

impl From<&RetrySection> for RetryConfig {
    fn from(r: &RetrySection) -> Self {
        RetryConfig::new()
            .max_attempts(r.max_attempts)
            .initial_delay(Duration::from_millis(r.initial_delay_ms))
            .max_delay(Duration::from_millis(r.max_delay_ms))
    }
}

/// Places cache settings. Off by default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSection {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            enabled: false,
            max_entries: default_max_entries(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

fn default_max_entries() -> u64 {
    1_000
}

fn default_ttl_secs() -> u64 {
    600
}

impl CacheSection {
    pub fn to_cache_config(&self) -> Option<CacheConfig> {
        self.enabled.then(|| {
            CacheConfig::new()
                .max_entries(self.max_entries)
                .ttl(Duration::from_secs(self.ttl_secs))
        })
    }
}

/// Secrets configuration (API keys).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub places: Option<ApiKeySecret>,
}

/// A single API key secret.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeySecret {
    pub api_key: String,
}

impl Config {
    /// Load configuration from the standard locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Config::default()),
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            WasteMapError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            WasteMapError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path; `None` when no file exists anywhere.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(WasteMapError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(CONFIG_DIR).join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        let system_config = Path::new(SYSTEM_CONFIG_DIR).join("config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings::new()
            .radius_m(self.places.radius_m)
            .category_suffix(self.places.category_suffix.clone())
    }

    /// A builder carrying every setting from this config and the secrets.
    pub fn builder(&self, secrets: &Secrets) -> WasteMapBuilder {
        let mut builder = WasteMapBuilder::new()
            .classifier_url(self.classifier.base_url.clone())
            .classifier_timeout(Duration::from_secs(self.classifier.timeout_secs))
            .places_url(self.places.base_url.clone())
            .places_timeout(Duration::from_secs(self.places.timeout_secs))
            .search_settings(self.search_settings())
            .retry(RetryConfig::from(&self.retry));

        if let Some(key) = secrets.places_api_key() {
            builder = builder.places_api_key(key);
        }
        if let Some(location) = self.location {
            builder = builder.location(location.into());
        }
        if let Some(cache) = self.cache.to_cache_config() {
            builder = builder.places_cache(cache);
        }
        builder
    }
}

impl Secrets {
    /// Load secrets from the standard locations with permission checks.
    ///
    /// Returns empty secrets if no file exists (the key may come from the
    /// environment).
    pub fn load() -> Result<Self> {
        if let Some(home) = dirs::home_dir() {
            let user_secrets = home.join(CONFIG_DIR).join("secrets.toml");
            if user_secrets.exists() {
                return Self::load_from_file(&user_secrets);
            }
        }

        let system_secrets = Path::new(SYSTEM_CONFIG_DIR).join("secrets.toml");
        if system_secrets.exists() {
            return Self::load_from_file(&system_secrets);
        }

        Ok(Secrets::default())
    }

    /// Load a secrets file after checking its permissions.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        Self::check_permissions(path)?;
        let content = fs::read_to_string(path).map_err(|e| {
            WasteMapError::Configuration(format!("Failed to read secrets file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            WasteMapError::Configuration(format!("Failed to parse secrets file {path:?}: {e}"))
        })
    }

    /// Check that the secrets file has secure permissions (0600 or 0400).
    #[cfg(unix)]
    fn check_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path).map_err(|e| {
            WasteMapError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
        })?;

        let mode = metadata.permissions().mode();
        if mode & 0o077 != 0 {
            return Err(WasteMapError::Configuration(format!(
                "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
                mode & 0o777
            )));
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn check_permissions(_path: &Path) -> Result<()> {
        Ok(())
    }

    /// Places API key, falling back to `GOOGLE_MAPS_API_KEY`.
    pub fn places_api_key(&self) -> Option<String> {
        self.places
            .as_ref()
            .map(|s| s.api_key.clone())
            .or_else(|| std::env::var(PLACES_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty())
    }
}

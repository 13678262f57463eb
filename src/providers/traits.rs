//! Collaborator traits for the classification workflow.
//!
//! Each external collaborator sits behind its own capability trait rather
//! than one combined client. This enables:
//! - Decorator patterns: `RetryingClassifier`, `CachingPlacesSearch`
//! - Test doubles that script results and count calls
//! - Swapping the geolocation source (fixed, absent, device-backed)
//!
//! Implementations report failures through [`WasteMapError`](crate::WasteMapError);
//! the workflow decides what each failure means for the session.

use async_trait::async_trait;

use crate::Result;
use crate::types::{BinQuery, Coordinates, ImageUpload, NearbyBin, WasteLabel};

// ============================================================================
// Classifier
// ============================================================================

/// Turns an uploaded image into a waste label.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Name for logging/metrics.
    fn name(&self) -> &str;

    async fn classify(&self, image: &ImageUpload) -> Result<WasteLabel>;
}

// ============================================================================
// Geolocation
// ============================================================================

/// Supplies the user's current position.
///
/// Returns `GeolocationUnavailable` when the capability does not exist at
/// all, and `GeolocationDenied` for permission or positioning failures.
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn current_position(&self) -> Result<Coordinates>;
}

// ============================================================================
// Places search
// ============================================================================

/// Finds places of a category within a radius.
#[async_trait]
pub trait PlacesSearch: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &BinQuery) -> Result<Vec<NearbyBin>>;
}

// ============================================================================
// Alerts
// ============================================================================

/// Receives user-facing, modal-level alerts.
///
/// Ordinary failures are only logged; alerts are reserved for conditions
/// the user has to act on.
pub trait AlertSink: Send + Sync {
    fn alert(&self, message: &str);
}

/// Alert sink that writes to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlerts;

impl AlertSink for LogAlerts {
    fn alert(&self, message: &str) {
        tracing::error!(message, "alert");
    }
}

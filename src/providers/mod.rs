//! Collaborator implementations for the classification workflow.
//!
//! HTTP clients for the classifier and places services, geolocation
//! sources, and the retry decorators that wrap them.

pub mod classifier;
pub mod geolocation;
mod http;
pub mod places;
pub mod retry;
pub mod traits;

pub use classifier::{ClassifierClient, DEFAULT_CLASSIFIER_URL};
pub use geolocation::{FixedLocation, NoGeolocation};
pub use http::DEFAULT_TIMEOUT;
pub use places::{DEFAULT_PLACES_URL, PlacesClient, PlacesResponse};
pub use retry::{RetryConfig, RetryingClassifier, RetryingPlacesSearch};
pub use traits::{AlertSink, Classifier, GeolocationProvider, LogAlerts, PlacesSearch};

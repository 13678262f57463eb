//! wastemap error types

use std::time::Duration;

/// wastemap error types
#[derive(Debug, thiserror::Error)]
pub enum WasteMapError {
    // Service/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("authentication failed")]
    AuthenticationFailed,

    /// The service answered 2xx but the body did not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),

    // Geolocation errors
    #[error("geolocation is not supported on this device")]
    GeolocationUnavailable,

    #[error("error getting location: {0}")]
    GeolocationDenied(String),

    /// A background task died before producing a result.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WasteMapError {
    /// Whether a retry of the same request could succeed.
    ///
    /// Network failures, rate limiting and 5xx responses are transient.
    /// Everything else (auth, malformed bodies, bad input, geolocation)
    /// is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            WasteMapError::Http(_) | WasteMapError::RateLimited { .. } => true,
            WasteMapError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Server-provided retry hint, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            WasteMapError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for WasteMapError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            WasteMapError::MalformedResponse(err.to_string())
        } else {
            WasteMapError::Http(err.to_string())
        }
    }
}

/// Result type alias for wastemap operations
pub type Result<T> = std::result::Result<T, WasteMapError>;

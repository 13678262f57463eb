//! Shared HTTP plumbing for the service clients.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::Deserialize;

use crate::{Result, WasteMapError};

/// Default per-request timeout for outbound calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("wastemap/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| WasteMapError::Configuration(format!("failed to build HTTP client: {e}")))
}

pub(crate) fn trim_base_url(base_url: impl Into<String>) -> String {
    base_url.into().trim_end_matches('/').to_string()
}

/// Error bodies seen from the classifier (`message`) and Google (`error_message`).
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

/// Pass successful responses through, map everything else to an error.
pub(crate) async fn check_status(response: Response, service: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs);
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message.or(b.error_message))
        .unwrap_or_else(|| format!("{service} error: {status}"));

    match status.as_u16() {
        401 | 403 => Err(WasteMapError::AuthenticationFailed),
        429 => Err(WasteMapError::RateLimited { retry_after }),
        code => Err(WasteMapError::Api {
            status: code,
            message,
        }),
    }
}

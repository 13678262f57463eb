//! HTTP client for the waste classification service.
//!
//! The service takes a multipart upload on `POST /classify/` with the
//! image in the `file` field and answers with a JSON object:
//!
//! ```json
//! { "result": "success", "message": "File uploaded successfully", "image_label": "plastic" }
//! ```
//!
//! Failures come back as non-2xx with `{ "result": "error", "message": "..." }`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, instrument};

use super::http::{DEFAULT_TIMEOUT, build_client, check_status, trim_base_url};
use super::traits::Classifier;
use crate::types::{ImageUpload, WasteLabel};
use crate::{Result, WasteMapError};

/// Default classifier endpoint (local development server).
pub const DEFAULT_CLASSIFIER_URL: &str = "http://localhost:8000";

/// Client for the classification service.
#[derive(Clone)]
pub struct ClassifierClient {
    http: Client,
    base_url: String,
}

impl ClassifierClient {
    /// Create a client for the service at `base_url` with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: build_client(timeout)?,
            base_url: trim_base_url(base_url),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload an image and return the predicted label.
    #[instrument(name = "classifier.classify", skip(self, image), fields(file = %image.file_name, bytes = image.bytes.len()))]
    pub async fn classify(&self, image: &ImageUpload) -> Result<WasteLabel> {
        let url = format!("{}/classify/", self.base_url);

        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)
            .map_err(|e| {
                WasteMapError::InvalidInput(format!(
                    "invalid content type {:?}: {e}",
                    image.content_type
                ))
            })?;
        let form = Form::new().part("file", part);

        let response = self.http.post(&url).multipart(form).send().await?;
        let response = check_status(response, "classifier").await?;

        let body: ClassifyResponse = response
            .json()
            .await
            .map_err(|e| WasteMapError::MalformedResponse(e.to_string()))?;
        debug!(result = ?body.result, message = ?body.message, "classifier response");

        if body.result.as_deref() == Some("error") {
            return Err(WasteMapError::Api {
                status: 200,
                message: body
                    .message
                    .unwrap_or_else(|| "classifier reported an error".to_string()),
            });
        }

        let label = body.image_label.ok_or_else(|| {
            WasteMapError::MalformedResponse("response has no image_label".to_string())
        })?;
        WasteLabel::new(label).map_err(|_| {
            WasteMapError::MalformedResponse("response has an empty image_label".to_string())
        })
    }
}

#[derive(Deserialize)]
struct ClassifyResponse {
    #[serde(default)]
    image_label: Option<String>,
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[async_trait]
impl Classifier for ClassifierClient {
    fn name(&self) -> &str {
        "classifier"
    }

    async fn classify(&self, image: &ImageUpload) -> Result<WasteLabel> {
        ClassifierClient::classify(self, image).await
    }
}

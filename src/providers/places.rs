//! Google Places Nearby Search client.
//!
//! See: <https://developers.google.com/maps/documentation/places/web-service/search-nearby>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use super::http::{DEFAULT_TIMEOUT, build_client, check_status, trim_base_url};
use super::traits::PlacesSearch;
use crate::types::{BinQuery, Coordinates, NearbyBin};
use crate::{Result, WasteMapError};

/// Default base URL for the Google Maps web services.
pub const DEFAULT_PLACES_URL: &str = "https://maps.googleapis.com";

const NEARBY_SEARCH_PATH: &str = "/maps/api/place/nearbysearch/json";

/// Client for the places nearby-search endpoint.
#[derive(Clone)]
pub struct PlacesClient {
    api_key: String,
    http: Client,
    base_url: String,
}

impl PlacesClient {
    /// Create a client against the public Google endpoint.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_PLACES_URL)
    }

    /// Create a client with a custom base URL (for testing with wiremock).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        Self::with_options(api_key, base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_options(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(WasteMapError::Configuration(
                "places API key is empty".to_string(),
            ));
        }
        Ok(Self {
            api_key,
            http: build_client(timeout)?,
            base_url: trim_base_url(base_url),
        })
    }

    /// Run a nearby search and map each result to a [`NearbyBin`].
    #[instrument(name = "places.search", skip(self), fields(category = %query.category, radius = query.radius_m))]
    pub async fn search(&self, query: &BinQuery) -> Result<Vec<NearbyBin>> {
        let url = format!("{}{}", self.base_url, NEARBY_SEARCH_PATH);
        let radius = query.radius_m.to_string();
        let location = query.location.to_query_param();

        let response = self
            .http
            .get(&url)
            .query(&[
                ("location", location.as_str()),
                ("radius", radius.as_str()),
                ("type", query.category.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;
        let response = check_status(response, "places").await?;

        let body: PlacesResponse = response
            .json()
            .await
            .map_err(|e| WasteMapError::MalformedResponse(e.to_string()))?;
        check_api_status(&body)?;

        let bins = body.into_bins();
        debug!(count = bins.len(), "places results");
        Ok(bins)
    }
}

/// Nearby-search response body.
#[derive(Debug, Clone, Deserialize)]
pub struct PlacesResponse {
    #[serde(default)]
    pub results: Vec<PlaceResult>,
    /// Absent in some proxies; treated as `OK`.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceResult {
    #[serde(default)]
    pub name: Option<String>,
    pub geometry: PlaceGeometry,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceGeometry {
    pub location: LatLng,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl From<PlaceResult> for NearbyBin {
    fn from(place: PlaceResult) -> Self {
        NearbyBin {
            kind: place.name.unwrap_or_default(),
            location: Coordinates::new(place.geometry.location.lat, place.geometry.location.lng),
        }
    }
}

impl PlacesResponse {
    /// Map results in order: `name` becomes the bin type, geometry its location.
    pub fn into_bins(self) -> Vec<NearbyBin> {
        self.results.into_iter().map(NearbyBin::from).collect()
    }
}

/// Map Google's in-body `status` onto our errors.
fn check_api_status(body: &PlacesResponse) -> Result<()> {
    let message = || {
        body.error_message
            .clone()
            .unwrap_or_else(|| format!("places status {}", body.status.as_deref().unwrap_or("")))
    };
    match body.status.as_deref() {
        None | Some("OK") | Some("ZERO_RESULTS") => Ok(()),
        Some("REQUEST_DENIED") => Err(WasteMapError::AuthenticationFailed),
        Some("OVER_QUERY_LIMIT") => Err(WasteMapError::RateLimited { retry_after: None }),
        Some("INVALID_REQUEST") => Err(WasteMapError::Api {
            status: 400,
            message: message(),
        }),
        Some(_) => Err(WasteMapError::Api {
            status: 500,
            message: message(),
        }),
    }
}

#[async_trait]
impl PlacesSearch for PlacesClient {
    fn name(&self) -> &str {
        "places"
    }

    async fn search(&self, query: &BinQuery) -> Result<Vec<NearbyBin>> {
        PlacesClient::search(self, query).await
    }
}

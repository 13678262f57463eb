//! Nearby bin results and the query that produces them

use serde::{Deserialize, Serialize};

use super::{Coordinates, WasteLabel};

/// Default places search radius in metres.
pub const DEFAULT_SEARCH_RADIUS_M: u32 = 5000;

/// Appended to the label to form the places category string.
pub const DEFAULT_CATEGORY_SUFFIX: &str = " dustbins";

/// A disposal location matching the classified category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyBin {
    #[serde(rename = "type")]
    pub kind: String,
    pub location: Coordinates,
}

/// How a label is turned into a places query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSettings {
    pub radius_m: u32,
    pub category_suffix: String,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            radius_m: DEFAULT_SEARCH_RADIUS_M,
            category_suffix: DEFAULT_CATEGORY_SUFFIX.to_string(),
        }
    }
}

impl SearchSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn radius_m(mut self, radius_m: u32) -> Self {
        self.radius_m = radius_m;
        self
    }

    pub fn category_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.category_suffix = suffix.into();
        self
    }
}

/// A nearby-places query.
#[derive(Debug, Clone, PartialEq)]
pub struct BinQuery {
    pub location: Coordinates,
    pub category: String,
    pub radius_m: u32,
}

impl BinQuery {
    /// Query for bins accepting `label` around `location`.
    pub fn for_label(label: &WasteLabel, location: Coordinates, settings: &SearchSettings) -> Self {
        Self {
            location,
            category: format!("{}{}", label.as_str(), settings.category_suffix),
            radius_m: settings.radius_m,
        }
    }
}

//! Geographic coordinates

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Result, WasteMapError};

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Reject non-finite or out-of-range values.
    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(WasteMapError::InvalidInput(format!(
                "latitude out of range: {}",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(WasteMapError::InvalidInput(format!(
                "longitude out of range: {}",
                self.longitude
            )));
        }
        Ok(())
    }

    /// `lat,lng` as used in places query strings.
    pub fn to_query_param(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

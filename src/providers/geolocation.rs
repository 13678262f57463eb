//! Geolocation sources.
//!
//! A command-line process has no device positioning API, so the position
//! is either configured ([`FixedLocation`]) or the capability is absent
//! ([`NoGeolocation`]).

use async_trait::async_trait;

use super::traits::GeolocationProvider;
use crate::types::Coordinates;
use crate::{Result, WasteMapError};

/// Always reports the same position.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation {
    position: Coordinates,
}

impl FixedLocation {
    /// Fails if the coordinates are out of range.
    pub fn new(position: Coordinates) -> Result<Self> {
        position.validate()?;
        Ok(Self { position })
    }
}

#[async_trait]
impl GeolocationProvider for FixedLocation {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn current_position(&self) -> Result<Coordinates> {
        Ok(self.position)
    }
}

/// No positioning capability at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeolocation;

#[async_trait]
impl GeolocationProvider for NoGeolocation {
    fn name(&self) -> &str {
        "none"
    }

    async fn current_position(&self) -> Result<Coordinates> {
        Err(WasteMapError::GeolocationUnavailable)
    }
}

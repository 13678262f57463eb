//! Classification labels

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Result, WasteMapError};

/// Label returned by the classifier service.
///
/// Any non-blank string is accepted; [`category()`](Self::category) tells
/// whether it is one of the categories the stock model is trained on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WasteLabel(String);

impl WasteLabel {
    pub fn new(label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return Err(WasteMapError::InvalidInput(
                "classification label is empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Upper-cased form shown to the user.
    pub fn display_name(&self) -> String {
        self.0.to_uppercase()
    }

    pub fn category(&self) -> Option<WasteCategory> {
        self.0.parse().ok()
    }
}

impl fmt::Display for WasteLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for WasteLabel {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Categories known to the stock waste classification model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WasteCategory {
    Cardboard,
    Glass,
    Metal,
    Paper,
    Plastic,
    Trash,
}

impl WasteCategory {
    pub const ALL: [WasteCategory; 6] = [
        WasteCategory::Cardboard,
        WasteCategory::Glass,
        WasteCategory::Metal,
        WasteCategory::Paper,
        WasteCategory::Plastic,
        WasteCategory::Trash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WasteCategory::Cardboard => "cardboard",
            WasteCategory::Glass => "glass",
            WasteCategory::Metal => "metal",
            WasteCategory::Paper => "paper",
            WasteCategory::Plastic => "plastic",
            WasteCategory::Trash => "trash",
        }
    }

    /// Whether this category normally goes to a recycling stream.
    pub fn is_recyclable(&self) -> bool {
        !matches!(self, WasteCategory::Trash)
    }
}

impl FromStr for WasteCategory {
    type Err = WasteMapError;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_lowercase();
        WasteCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == lower)
            .ok_or_else(|| WasteMapError::InvalidInput(format!("unknown waste category: {s}")))
    }
}

impl fmt::Display for WasteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

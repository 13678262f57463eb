//! Presentation data derived from [`WorkflowState`].
//!
//! [`ResultsView`] is what a front end needs to draw the session: the
//! preview, the status line, the heading above the map, and the map's
//! markers. It holds no behaviour; rendering is up to the caller.

use std::fmt;

use serde::Serialize;

use super::state::{Notice, WorkflowState};
use crate::types::{Coordinates, ImagePreview};

/// Initial map zoom level.
pub const DEFAULT_MAP_ZOOM: u8 = 13;

pub const PROCESSING_TEXT: &str = "Processing Image";
pub const USER_MARKER_POPUP: &str = "Your location";

/// Status line under the image input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "label", rename_all = "snake_case")]
pub enum StatusLine {
    Processing,
    /// Upper-cased label.
    Classified(String),
}

impl StatusLine {
    pub fn text(&self) -> &str {
        match self {
            StatusLine::Processing => PROCESSING_TEXT,
            StatusLine::Classified(label) => label,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    User,
    Bin,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub kind: MarkerKind,
    pub position: Coordinates,
    pub popup: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub center: Coordinates,
    pub zoom: u8,
    pub markers: Vec<Marker>,
}

impl MapView {
    pub fn user_marker(&self) -> Option<&Marker> {
        self.markers.iter().find(|m| m.kind == MarkerKind::User)
    }

    pub fn bin_markers(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter().filter(|m| m.kind == MarkerKind::Bin)
    }
}

/// Everything a front end shows for the current session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<ImagePreview>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusLine>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    /// Present only once the user's location is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map: Option<MapView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

impl ResultsView {
    pub fn from_state(state: &WorkflowState) -> Self {
        let status = if state.is_processing() {
            Some(StatusLine::Processing)
        } else {
            state
                .label()
                .map(|label| StatusLine::Classified(label.display_name()))
        };

        let heading = state
            .label()
            .map(|label| {
                format!(
                    "{}{} near your location:",
                    label.display_name(),
                    state.settings().category_suffix
                )
            });

        let map = state.location().map(|center| {
            let user = Marker {
                kind: MarkerKind::User,
                position: center,
                popup: USER_MARKER_POPUP.to_string(),
            };
            let bins = state.visible_bins().iter().map(|bin| Marker {
                kind: MarkerKind::Bin,
                position: bin.location,
                popup: format!("Dustbin Type: {}", bin.kind),
            });
            MapView {
                center,
                zoom: DEFAULT_MAP_ZOOM,
                markers: std::iter::once(user).chain(bins).collect(),
            }
        });

        Self {
            preview: state.preview().cloned(),
            status,
            heading,
            map,
            notice: state.last_error().cloned(),
        }
    }
}

impl fmt::Display for ResultsView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(preview) = &self.preview {
            writeln!(
                f,
                "Image: {} ({}, {} bytes)",
                preview.file_name, preview.content_type, preview.byte_len
            )?;
        }
        match &self.status {
            Some(StatusLine::Processing) => writeln!(f, "{PROCESSING_TEXT}")?,
            Some(StatusLine::Classified(label)) => {
                writeln!(f, "Image is classified as: {label}")?
            }
            None => {}
        }
        if let Some(notice) = &self.notice {
            writeln!(f, "Error: {}", notice.message)?;
        }
        if let Some(heading) = &self.heading {
            writeln!(f, "{heading}")?;
        }
        if let Some(map) = &self.map {
            writeln!(f, "  Map centre {} (zoom {})", map.center, map.zoom)?;
            for marker in &map.markers {
                writeln!(f, "  - {} @ {}", marker.popup, marker.position)?;
            }
        }
        Ok(())
    }
}

//! Events consumed and commands emitted by the workflow reducer.

use crate::WasteMapError;
use crate::types::{BinQuery, Coordinates, ImagePreview, ImageUpload, NearbyBin, WasteLabel};

/// Submission counter. Every result is tagged with the generation that
/// requested it; results from superseded generations are dropped.
pub type Generation = u64;

/// Something that happened: a user action or an async resolution.
#[derive(Debug)]
pub enum Event {
    /// A file was chosen but not yet sent.
    ImageSelected { preview: ImagePreview },

    /// A file was submitted for classification.
    ImageSubmitted { upload: ImageUpload },

    ClassificationSucceeded {
        generation: Generation,
        label: WasteLabel,
    },

    ClassificationFailed {
        generation: Generation,
        error: WasteMapError,
    },

    LocationResolved {
        generation: Generation,
        position: Coordinates,
    },

    LocationFailed {
        generation: Generation,
        error: WasteMapError,
    },

    BinsFound {
        generation: Generation,
        bins: Vec<NearbyBin>,
    },

    BinSearchFailed {
        generation: Generation,
        error: WasteMapError,
    },
}

impl Event {
    /// Generation of an async result; `None` for user actions.
    pub fn generation(&self) -> Option<Generation> {
        match self {
            Event::ImageSelected { .. } | Event::ImageSubmitted { .. } => None,
            Event::ClassificationSucceeded { generation, .. }
            | Event::ClassificationFailed { generation, .. }
            | Event::LocationResolved { generation, .. }
            | Event::LocationFailed { generation, .. }
            | Event::BinsFound { generation, .. }
            | Event::BinSearchFailed { generation, .. } => Some(*generation),
        }
    }

    /// Collaborator that produced this event, for logs and metrics.
    pub fn service(&self) -> &'static str {
        match self {
            Event::ImageSelected { .. } | Event::ImageSubmitted { .. } => "user",
            Event::ClassificationSucceeded { .. } | Event::ClassificationFailed { .. } => {
                "classifier"
            }
            Event::LocationResolved { .. } | Event::LocationFailed { .. } => "geolocation",
            Event::BinsFound { .. } | Event::BinSearchFailed { .. } => "places",
        }
    }
}

/// Side effect requested by the reducer, carried out by the controller.
#[derive(Debug)]
pub enum Command {
    /// Upload the image. Supersedes all in-flight work.
    Classify {
        generation: Generation,
        upload: ImageUpload,
    },

    LocateUser { generation: Generation },

    SearchBins {
        generation: Generation,
        query: BinQuery,
    },

    /// Modal-level message for the user.
    Alert { message: String },
}

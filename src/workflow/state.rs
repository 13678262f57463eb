//! Session state and the reducer that transitions it.
//!
//! [`WorkflowState::apply`] is pure apart from logging: it takes one
//! [`Event`], updates the state, and returns the [`Command`]s the
//! controller should carry out next. All ordering rules live here:
//!
//! - geolocation is requested only once a label exists, and again only
//!   when the label changes
//! - the places query is issued only once both label and location exist
//! - results tagged with an older [`Generation`] are discarded

use serde::Serialize;
use tracing::{debug, error, warn};

use super::event::{Command, Event, Generation};
use crate::WasteMapError;
use crate::telemetry;
use crate::types::{
    BinQuery, Coordinates, ImagePreview, NearbyBin, SearchSettings, WasteLabel,
};

/// Shown when the device has no positioning capability.
pub const GEOLOCATION_UNSUPPORTED_MESSAGE: &str = "Geolocation is not supported on this device";

/// Where the session is in the pipeline.
///
/// `Classified` is only held when no location lookup follows: the
/// lookup failed, or the label repeated before any location was known. A
/// new label moves straight on to `LocatingUser`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    Selecting,
    Classifying,
    Classified,
    LocatingUser,
    QueryingBins,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    ClassificationFailed,
    GeolocationUnavailable,
    GeolocationDenied,
    PlacesQueryFailed,
}

/// The most recent failure, kept for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

/// All transient state of one session.
#[derive(Debug, Clone)]
pub struct WorkflowState {
    settings: SearchSettings,
    stage: Stage,
    generation: Generation,
    processing: bool,
    preview: Option<ImagePreview>,
    label: Option<WasteLabel>,
    location: Option<Coordinates>,
    bins: Vec<NearbyBin>,
    last_error: Option<Notice>,
    // Lookups issued but not yet answered; a superseding submission may
    // have aborted them.
    awaiting_location: bool,
    awaiting_bins: bool,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self::new(SearchSettings::default())
    }
}

impl WorkflowState {
    pub fn new(settings: SearchSettings) -> Self {
        Self {
            settings,
            stage: Stage::Idle,
            generation: 0,
            processing: false,
            preview: None,
            label: None,
            location: None,
            bins: Vec::new(),
            last_error: None,
            awaiting_location: false,
            awaiting_bins: false,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Current submission generation (0 before the first submission).
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// True while a classify call is in flight.
    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn preview(&self) -> Option<&ImagePreview> {
        self.preview.as_ref()
    }

    pub fn label(&self) -> Option<&WasteLabel> {
        self.label.as_ref()
    }

    pub fn location(&self) -> Option<Coordinates> {
        self.location
    }

    /// The stored bin list, regardless of whether it is currently meaningful.
    pub fn bins(&self) -> &[NearbyBin] {
        &self.bins
    }

    /// Bins to show: empty unless both label and location are known.
    pub fn visible_bins(&self) -> &[NearbyBin] {
        if self.label.is_some() && self.location.is_some() {
            &self.bins
        } else {
            &[]
        }
    }

    pub fn last_error(&self) -> Option<&Notice> {
        self.last_error.as_ref()
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Apply one event and return the follow-up commands.
    pub fn apply(&mut self, event: Event) -> Vec<Command> {
        if let Some(generation) = event.generation() {
            if generation != self.generation {
                debug!(
                    service = event.service(),
                    generation,
                    current = self.generation,
                    "discarding superseded result"
                );
                metrics::counter!(telemetry::STALE_EVENTS_TOTAL, "service" => event.service())
                    .increment(1);
                return Vec::new();
            }
        }

        match event {
            Event::ImageSelected { preview } => {
                if self.processing {
                    // The preview must keep showing the image being classified.
                    debug!(file = %preview.file_name, "selection ignored while classifying");
                    return Vec::new();
                }
                self.preview = Some(preview);
                self.stage = Stage::Selecting;
                Vec::new()
            }

            Event::ImageSubmitted { upload } => {
                self.generation += 1;
                self.preview = Some(upload.preview());
                self.processing = true;
                self.last_error = None;
                self.stage = Stage::Classifying;
                vec![Command::Classify {
                    generation: self.generation,
                    upload,
                }]
            }

            Event::ClassificationSucceeded { generation, label } => {
                debug!(%label, "image classified");
                self.processing = false;
                if self.label.as_ref() != Some(&label) {
                    self.label = Some(label);
                    return self.locate_user(generation);
                }
                self.resume_unchanged_label(generation)
            }

            Event::ClassificationFailed { error, .. } => {
                // The previous label, if any, stays in place.
                warn!(error = %error, "classification failed");
                self.processing = false;
                self.stage = Stage::Idle;
                self.record(NoticeKind::ClassificationFailed, &error);
                Vec::new()
            }

            Event::LocationResolved {
                generation,
                position,
            } => {
                self.awaiting_location = false;
                self.location = Some(position);
                if self.label.is_some() {
                    self.search_bins(generation)
                } else {
                    self.stage = Stage::Idle;
                    Vec::new()
                }
            }

            Event::LocationFailed { error, .. } => {
                self.awaiting_location = false;
                self.stage = Stage::Classified;
                if matches!(error, WasteMapError::GeolocationUnavailable) {
                    error!("geolocation is not supported");
                    self.record(NoticeKind::GeolocationUnavailable, &error);
                    vec![Command::Alert {
                        message: GEOLOCATION_UNSUPPORTED_MESSAGE.to_string(),
                    }]
                } else {
                    warn!(error = %error, "error getting location");
                    self.record(NoticeKind::GeolocationDenied, &error);
                    Vec::new()
                }
            }

            Event::BinsFound { bins, .. } => {
                debug!(count = bins.len(), "nearby bins updated");
                self.awaiting_bins = false;
                self.bins = bins;
                self.stage = Stage::Ready;
                Vec::new()
            }

            Event::BinSearchFailed { error, .. } => {
                // Previous bins are kept.
                warn!(error = %error, "error fetching nearby bins");
                self.awaiting_bins = false;
                self.stage = Stage::Ready;
                self.record(NoticeKind::PlacesQueryFailed, &error);
                Vec::new()
            }
        }
    }

    fn locate_user(&mut self, generation: Generation) -> Vec<Command> {
        self.awaiting_location = true;
        self.stage = Stage::LocatingUser;
        vec![Command::LocateUser { generation }]
    }

    /// Issue the places query; nothing unless both label and location exist.
    fn search_bins(&mut self, generation: Generation) -> Vec<Command> {
        let (Some(label), Some(location)) = (&self.label, self.location) else {
            return Vec::new();
        };
        let query = BinQuery::for_label(label, location, &self.settings);
        self.awaiting_bins = true;
        self.stage = Stage::QueryingBins;
        vec![Command::SearchBins { generation, query }]
    }

    /// Same label again: nothing is re-requested unless an earlier lookup
    /// for it was cut short by this submission.
    fn resume_unchanged_label(&mut self, generation: Generation) -> Vec<Command> {
        if self.awaiting_location {
            return self.locate_user(generation);
        }
        if self.awaiting_bins && self.location.is_some() {
            return self.search_bins(generation);
        }
        debug!("label unchanged; keeping location and bins");
        self.stage = if self.location.is_some() {
            Stage::Ready
        } else {
            Stage::Classified
        };
        Vec::new()
    }

    fn record(&mut self, kind: NoticeKind, error: &WasteMapError) {
        self.last_error = Some(Notice {
            kind,
            message: error.to_string(),
        });
    }
}

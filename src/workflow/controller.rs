//! The classification workflow controller.
//!
//! [`Workflow`] owns the [`WorkflowState`] and the collaborators. User
//! actions and async results both enter through [`Workflow::dispatch`];
//! the reducer answers with [`Command`]s, which the controller turns into
//! tokio tasks. Each task resolves to exactly one [`Event`].
//!
//! A new submission aborts every in-flight task, and the reducer drops any
//! result from an older generation, so the latest submission always wins.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use futures_util::FutureExt;
use tokio::task::JoinSet;
use tracing::{debug, error, instrument};

use super::event::{Command, Event};
use super::state::WorkflowState;
use super::view::ResultsView;
use crate::providers::{AlertSink, Classifier, GeolocationProvider, PlacesSearch};
use crate::telemetry;
use crate::types::{ImageUpload, SearchSettings};
use crate::{Result, WasteMapError};

/// The collaborators a [`Workflow`] talks to.
#[derive(Clone)]
pub struct Services {
    pub classifier: Arc<dyn Classifier>,
    pub geolocation: Arc<dyn GeolocationProvider>,
    pub places: Arc<dyn PlacesSearch>,
    pub alerts: Arc<dyn AlertSink>,
}

/// Single-owner controller for one session.
///
/// Methods that start work ([`submit_image`](Self::submit_image),
/// [`dispatch`](Self::dispatch)) must be called from within a tokio runtime.
pub struct Workflow {
    state: WorkflowState,
    services: Services,
    tasks: JoinSet<Event>,
}

impl Workflow {
    pub fn new(services: Services, settings: SearchSettings) -> Self {
        Self {
            state: WorkflowState::new(settings),
            services,
            tasks: JoinSet::new(),
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn view(&self) -> ResultsView {
        ResultsView::from_state(&self.state)
    }

    /// Read an image from disk and show it as the current selection.
    ///
    /// Nothing is sent until the returned upload is passed to
    /// [`submit_image`](Self::submit_image).
    pub async fn select_image(&mut self, path: impl AsRef<Path>) -> Result<ImageUpload> {
        let upload = ImageUpload::from_path(path).await?;
        self.dispatch(Event::ImageSelected {
            preview: upload.preview(),
        });
        Ok(upload)
    }

    /// Send an image for classification. The rest of the pipeline follows
    /// as results arrive; drive it with [`step`](Self::step) or
    /// [`settle`](Self::settle).
    pub fn submit_image(&mut self, upload: ImageUpload) {
        self.dispatch(Event::ImageSubmitted { upload });
    }

    /// Apply an event and start whatever work it calls for.
    pub fn dispatch(&mut self, event: Event) {
        for command in self.state.apply(event) {
            self.execute(command);
        }
    }

    /// Whether any collaborator call is still outstanding.
    pub fn has_pending(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Wait for the next result and apply it.
    ///
    /// Returns `false` once nothing is in flight.
    pub async fn step(&mut self) -> bool {
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(event) => {
                    self.dispatch(event);
                    return true;
                }
                Err(e) if e.is_cancelled() => continue,
                Err(e) => {
                    // Tasks catch their own panics; anything else is a runtime fault.
                    error!(error = %e, "workflow task failed");
                }
            }
        }
        false
    }

    /// Run until the pipeline for the latest submission has finished.
    pub async fn settle(&mut self) {
        while self.step().await {}
    }

    /// Submit an image and wait for the whole pipeline to finish.
    #[instrument(skip(self, upload), fields(file = %upload.file_name))]
    pub async fn run(&mut self, upload: ImageUpload) -> ResultsView {
        self.submit_image(upload);
        self.settle().await;
        self.view()
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::Classify { generation, upload } => {
                if !self.tasks.is_empty() {
                    debug!(generation, "new submission supersedes in-flight work");
                    self.tasks.abort_all();
                }
                let classifier = Arc::clone(&self.services.classifier);
                self.tasks.spawn(async move {
                    match observe("classifier", classifier.classify(&upload)).await {
                        Ok(label) => Event::ClassificationSucceeded { generation, label },
                        Err(error) => Event::ClassificationFailed { generation, error },
                    }
                });
            }
            Command::LocateUser { generation } => {
                let geolocation = Arc::clone(&self.services.geolocation);
                self.tasks.spawn(async move {
                    match observe("geolocation", geolocation.current_position()).await {
                        Ok(position) => Event::LocationResolved {
                            generation,
                            position,
                        },
                        Err(error) => Event::LocationFailed { generation, error },
                    }
                });
            }
            Command::SearchBins { generation, query } => {
                let places = Arc::clone(&self.services.places);
                self.tasks.spawn(async move {
                    match observe("places", places.search(&query)).await {
                        Ok(bins) => Event::BinsFound { generation, bins },
                        Err(error) => Event::BinSearchFailed { generation, error },
                    }
                });
            }
            Command::Alert { message } => self.services.alerts.alert(&message),
        }
    }
}

/// Run a collaborator call, recording request metrics and turning a panic
/// into an error so every task still yields an event.
async fn observe<T, F>(service: &'static str, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let start = Instant::now();
    let result = AssertUnwindSafe(call)
        .catch_unwind()
        .await
        .unwrap_or_else(|_| Err(WasteMapError::Internal(format!("{service} call panicked"))));

    let status = if result.is_ok() { "ok" } else { "error" };
    metrics::counter!(telemetry::REQUESTS_TOTAL, "service" => service, "status" => status)
        .increment(1);
    metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS, "service" => service)
        .record(start.elapsed().as_secs_f64());
    result
}

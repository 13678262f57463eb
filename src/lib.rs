//! wastemap - classify waste photos and find nearby disposal bins
//!
//! An image is uploaded to a classification service, the predicted label
//! is shown, and bins accepting that kind of waste are looked up around
//! the user's location through a places search API.
//!
//! The pipeline is driven by a [`Workflow`]: a single-owner controller
//! whose state only changes through typed [`Event`]s applied by a reducer.
//!
//! # Example
//!
//! ```rust,no_run
//! use wastemap::{Coordinates, ImageUpload, WasteMap};
//!
//! #[tokio::main]
//! async fn main() -> wastemap::Result<()> {
//!     let mut workflow = WasteMap::builder()
//!         .classifier_url("http://localhost:8000")
//!         .places_api_key("your-maps-key")
//!         .location(Coordinates::new(37.77, -122.41))
//!         .build()?;
//!
//!     let image = ImageUpload::from_path("bottle.jpg").await?;
//!     let view = workflow.run(image).await;
//!
//!     print!("{view}");
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod providers;
pub mod telemetry;
pub mod types;
mod version;
pub mod workflow;

// Re-export main types at crate root
pub use cache::CacheConfig;
pub use config::{Config, Secrets};
pub use error::{Result, WasteMapError};
pub use providers::{
    AlertSink, Classifier, ClassifierClient, GeolocationProvider, PlacesClient, PlacesSearch,
    RetryConfig,
};
pub use version::{BuildInfo, PKG_VERSION, version_string};
pub use workflow::{
    Event, ResultsView, Services, Stage, WasteMap, WasteMapBuilder, Workflow, WorkflowState,
};

// Re-export all types
pub use types::{
    BinQuery, Coordinates, ImagePreview, ImageUpload, NearbyBin, SearchSettings, WasteCategory,
    WasteLabel,
};

//! Classification workflow: image → label → location → nearby bins.
//!
//! - [`state`]: session state and the event reducer
//! - [`event`]: events in, commands out
//! - [`controller`]: executes commands as tokio tasks
//! - [`view`]: presentation data derived from the state
//! - [`builder`]: assembles a [`Workflow`] from clients and settings

pub mod builder;
pub mod controller;
pub mod event;
pub mod state;
pub mod view;

pub use builder::{WasteMap, WasteMapBuilder};
pub use controller::{Services, Workflow};
pub use event::{Command, Event, Generation};
pub use state::{GEOLOCATION_UNSUPPORTED_MESSAGE, Notice, NoticeKind, Stage, WorkflowState};
pub use view::{MapView, Marker, MarkerKind, ResultsView, StatusLine};

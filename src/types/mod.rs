//! Public types for the wastemap API.

mod bin;
mod coords;
mod image;
mod label;

pub use bin::{BinQuery, DEFAULT_CATEGORY_SUFFIX, DEFAULT_SEARCH_RADIUS_M, NearbyBin, SearchSettings};
pub use coords::Coordinates;
pub use image::{ImagePreview, ImageUpload, content_type_for};
pub use label::{WasteCategory, WasteLabel};

//! Caching subsystem.
//!
//! - [`places::PlacesCache`]: opt-in LRU + TTL cache for nearby-places
//!   queries, applied through the [`CachingPlacesSearch`] decorator.
//!   Activated via the builder's `.places_cache()` method.

pub mod places;

pub use places::{CacheConfig, CachingPlacesSearch, PlacesCache};

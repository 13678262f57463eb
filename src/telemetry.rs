//! Telemetry metric name constants.
//!
//! Centralised metric names for wastemap operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `wastemap_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `service`: collaborator invoked: "classifier", "geolocation" or "places"
//! - `status`: outcome: "ok" or "error"

/// Total outbound requests issued by the workflow.
///
/// Labels: `service`, `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "wastemap_requests_total";

/// Request duration in seconds.
///
/// Labels: `service`.
pub const REQUEST_DURATION_SECONDS: &str = "wastemap_request_duration_seconds";

/// Total retry attempts (not counting the initial request).
///
/// Labels: `service`.
pub const RETRIES_TOTAL: &str = "wastemap_retries_total";

/// Total places cache hits.
pub const CACHE_HITS_TOTAL: &str = "wastemap_cache_hits_total";

/// Total places cache misses.
pub const CACHE_MISSES_TOTAL: &str = "wastemap_cache_misses_total";

/// Results discarded because a newer submission superseded them.
///
/// Labels: `service`.
pub const STALE_EVENTS_TOTAL: &str = "wastemap_stale_events_total";

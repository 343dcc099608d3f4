//! Telemetry metric name constants.
//!
//! Centralised metric names for muninn operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `muninn_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).

/// Total lookups answered from the store.
pub const CACHE_HITS_TOTAL: &str = "muninn_cache_hits_total";

/// Total lookups that missed the store.
pub const CACHE_MISSES_TOTAL: &str = "muninn_cache_misses_total";

/// Refresh candidates proposed per miss, target excluded.
pub const REFRESH_CANDIDATES: &str = "muninn_refresh_candidates";

/// Entries trimmed from the reference window.
pub const WINDOW_EVICTIONS_TOTAL: &str = "muninn_window_evictions_total";

/// Total oracle calls.
///
/// Labels: `status` ("ok" | "error").
pub const ORACLE_REQUESTS_TOTAL: &str = "muninn_oracle_requests_total";

/// Oracle call duration in seconds.
pub const ORACLE_REQUEST_DURATION_SECONDS: &str = "muninn_oracle_request_duration_seconds";

/// Total oracle retry attempts (not counting the initial request).
pub const ORACLE_RETRIES_TOTAL: &str = "muninn_oracle_retries_total";

/// Oracle responses rejected because the requested identifier was missing.
pub const INVALID_RESPONSES_TOTAL: &str = "muninn_invalid_responses_total";

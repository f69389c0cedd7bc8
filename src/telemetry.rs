//! Telemetry metric name constants.
//!
//! Centralised metric names for huginn operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `huginn_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `source` — where a reply came from: "cache", "quick", "model", "fallback"
//! - `layer` — cache layer that answered: "memo" or "dictionary"
//! - `status` — outcome: "ok" or "error"

/// Total replies returned by the pipeline.
///
/// Labels: `source`.
pub const REQUESTS_TOTAL: &str = "huginn_requests_total";

/// Total response cache hits.
///
/// Labels: `layer` ("memo" | "dictionary").
pub const CACHE_HITS_TOTAL: &str = "huginn_cache_hits_total";

/// Total response cache misses.
pub const CACHE_MISSES_TOTAL: &str = "huginn_cache_misses_total";

/// Total full clears of the dictionary cache.
pub const CACHE_CLEARS_TOTAL: &str = "huginn_cache_clears_total";

/// Total canned replies served by the pattern matcher.
pub const QUICK_REPLIES_TOTAL: &str = "huginn_quick_replies_total";

/// Wall-clock duration of model generate calls, in seconds.
pub const GENERATION_DURATION_SECONDS: &str = "huginn_generation_duration_seconds";

/// Total generate calls that failed and were replaced by the error template.
pub const GENERATION_FAILURES_TOTAL: &str = "huginn_generation_failures_total";

/// Total model construction attempts.
///
/// Labels: `status` ("ok" | "error").
pub const MODEL_LOADS_TOTAL: &str = "huginn_model_loads_total";

/// Total submissions rejected because the work queue was full.
pub const DISPATCH_REJECTED_TOTAL: &str = "huginn_dispatch_rejected_total";

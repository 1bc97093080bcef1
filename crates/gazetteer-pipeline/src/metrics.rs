//! Observability metrics for the acquisition pipeline.
//!
//! Metrics are exposed via the `metrics` crate facade; a deployment
//! installs its own recorder (e.g. a Prometheus exporter) at process
//! start.
//!
//! ## Metrics Exported
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `gazetteer_fetch_requests_total` | Counter | `decision` | Fetch request outcomes (completed / deduplicated / enqueued) |
//! | `gazetteer_batch_items_total` | Counter | `outcome` | Batch item outcomes (processed / malformed_payload / missing_key / fetch_failed / storage) |
//! | `gazetteer_source_fetches_total` | Counter | `result` | Upstream fetch attempts by result |
//! | `gazetteer_queue_depth` | Gauge | - | Approximate visible queue depth |

use metrics::{counter, gauge};

/// Metric names as constants for consistency.
pub mod names {
    /// Counter: fetch request outcomes.
    pub const FETCH_REQUESTS_TOTAL: &str = "gazetteer_fetch_requests_total";
    /// Counter: batch item outcomes.
    pub const BATCH_ITEMS_TOTAL: &str = "gazetteer_batch_items_total";
    /// Counter: upstream fetch attempts by result.
    pub const SOURCE_FETCHES_TOTAL: &str = "gazetteer_source_fetches_total";
    /// Gauge: approximate visible queue depth.
    pub const QUEUE_DEPTH: &str = "gazetteer_queue_depth";
}

/// Label keys used across metrics.
pub mod labels {
    /// The dedup decision taken by `request_fetch`.
    pub const DECISION: &str = "decision";
    /// The per-item outcome in a consumed batch.
    pub const OUTCOME: &str = "outcome";
    /// The result of an upstream fetch attempt.
    pub const RESULT: &str = "result";
}

/// Handle for recording pipeline metrics.
///
/// Cheap to clone; all state lives in the globally installed recorder.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineMetrics;

impl PipelineMetrics {
    /// Creates a new metrics handle.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Records the dedup decision taken by a fetch request.
    pub fn record_fetch_decision(&self, decision: &'static str) {
        counter!(names::FETCH_REQUESTS_TOTAL, labels::DECISION => decision).increment(1);
    }

    /// Records one consumed batch item's outcome.
    pub fn record_batch_item(&self, outcome: &'static str) {
        counter!(names::BATCH_ITEMS_TOTAL, labels::OUTCOME => outcome).increment(1);
    }

    /// Records an upstream fetch attempt.
    pub fn record_source_fetch(&self, result: &'static str) {
        counter!(names::SOURCE_FETCHES_TOTAL, labels::RESULT => result).increment(1);
    }

    /// Updates the approximate visible queue depth.
    #[allow(clippy::cast_precision_loss)]
    pub fn set_queue_depth(&self, depth: usize) {
        gauge!(names::QUEUE_DEPTH).set(depth as f64);
    }
}

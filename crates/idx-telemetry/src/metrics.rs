//! Prometheus metrics for the indexer coordinator.
//!
//! All metrics follow the naming convention: `idx_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., idx_reindex_total)
//! - **Gauge**: Value that can go up or down (e.g., idx_view_backlog)
//! - **Histogram**: Distribution of values (e.g., idx_reindex_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Encoder, HistogramVec, IntCounter, IntCounterVec,
    IntGaugeVec, Opts, Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // REINDEX METRICS
    // =========================================================================

    /// Full rebuilds by outcome
    pub static ref REINDEX_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("idx_reindex_total", "Total full reindex attempts"),
        &["indexer", "outcome"]  // outcome: completed/failed/skipped
    ).expect("metric creation failed");

    /// Full rebuild duration
    pub static ref REINDEX_DURATION: HistogramVec = HistogramVec::new(
        prometheus::HistogramOpts::new(
            "idx_reindex_duration_seconds",
            "Time spent in full reindex"
        ).buckets(exponential_buckets(0.01, 2.0, 16).unwrap()),
        &["indexer"]
    ).expect("metric creation failed");

    /// Rows pushed through partial reindex
    pub static ref ROWS_REINDEXED: IntCounterVec = IntCounterVec::new(
        Opts::new("idx_rows_reindexed_total", "Total entity ids reindexed by row/list updates"),
        &["indexer"]
    ).expect("metric creation failed");

    // =========================================================================
    // STATUS METRICS
    // =========================================================================

    /// Indexers marked invalid
    pub static ref INVALIDATIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("idx_invalidations_total", "Total indexer invalidations"),
        &["indexer"]
    ).expect("metric creation failed");

    /// Views suspended around full rebuilds
    pub static ref VIEWS_SUSPENDED: IntCounter = IntCounter::new(
        "idx_views_suspended_total",
        "Total change-log views suspended for full rebuilds"
    ).expect("metric creation failed");

    /// Pending change-log entries per view
    pub static ref VIEW_BACKLOG: IntGaugeVec = IntGaugeVec::new(
        Opts::new("idx_view_backlog", "Change-log versions not yet applied"),
        &["view"]
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Calling this more than once is harmless: already registered collectors
/// are skipped.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Reindex
        Box::new(REINDEX_TOTAL.clone()),
        Box::new(REINDEX_DURATION.clone()),
        Box::new(ROWS_REINDEXED.clone()),
        // Status
        Box::new(INVALIDATIONS.clone()),
        Box::new(VIEWS_SUSPENDED.clone()),
        Box::new(VIEW_BACKLOG.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

//! Forwards coordinator metrics to the Prometheus registry.

use idx_coordinator::{MetricsRecorder, ReindexResultKind};
use idx_telemetry::{
    INVALIDATIONS, REINDEX_DURATION, REINDEX_TOTAL, ROWS_REINDEXED, VIEWS_SUSPENDED, VIEW_BACKLOG,
};
use std::time::Duration;

/// `MetricsRecorder` writing to the `idx-telemetry` collectors.
#[derive(Clone, Copy, Debug, Default)]
pub struct PrometheusMetrics;

impl PrometheusMetrics {
    /// Publish the pending changelog size of `view_id`.
    pub fn observe_backlog(view_id: &str, backlog: u64) {
        VIEW_BACKLOG
            .with_label_values(&[view_id])
            .set(i64::try_from(backlog).unwrap_or(i64::MAX));
    }
}

impl MetricsRecorder for PrometheusMetrics {
    fn record_reindex(&self, indexer_id: &str, result: ReindexResultKind, duration: Duration) {
        REINDEX_TOTAL
            .with_label_values(&[indexer_id, result.as_str()])
            .inc();
        if result != ReindexResultKind::Skipped {
            REINDEX_DURATION
                .with_label_values(&[indexer_id])
                .observe(duration.as_secs_f64());
        }
    }

    fn record_rows_reindexed(&self, indexer_id: &str, rows: usize) {
        ROWS_REINDEXED
            .with_label_values(&[indexer_id])
            .inc_by(rows as u64);
    }

    fn record_invalidation(&self, indexer_id: &str) {
        INVALIDATIONS.with_label_values(&[indexer_id]).inc();
    }

    fn record_views_suspended(&self, _indexer_id: &str, views: usize) {
        VIEWS_SUSPENDED.inc_by(views as u64);
    }
}

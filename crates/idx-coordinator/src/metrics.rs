//! Metrics hooks for indexer operations
//!
//! Counters for full and partial reindexing, invalidations and changelog
//! suspensions. Wire a `MetricsRecorder` into `IndexerContext::with_metrics`
//! to forward these to an external system.
//!
//! ## Usage
//!
//! ```ignore
//! use idx_coordinator::metrics::{Metrics, MetricsRecorder};
//!
//! let metrics = Arc::new(Metrics::new());
//! let ctx = IndexerContext::new(config, store, working, views, actions)
//!     .with_metrics(metrics.clone());
//! // ... reindex ...
//! println!("{:?}", metrics.snapshot());
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// How a full reindex call ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReindexResultKind {
    /// The action ran and succeeded.
    Completed,
    /// The action or surrounding bookkeeping failed.
    Failed,
    /// Nothing ran (already working or suspended).
    Skipped,
}

impl ReindexResultKind {
    /// Label value for external systems.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Metrics collector for indexer operations
#[derive(Default)]
pub struct Metrics {
    /// Full reindexes that completed
    pub reindex_completed: AtomicU64,
    /// Full reindexes that failed
    pub reindex_failed: AtomicU64,
    /// Full reindexes skipped
    pub reindex_skipped: AtomicU64,
    /// Entity rows passed to row/list reindexing
    pub rows_reindexed: AtomicU64,
    /// Invalidations
    pub invalidations: AtomicU64,
    /// Views suspended around full reindexes
    pub views_suspended: AtomicU64,
    /// Cumulative full reindex time in nanoseconds
    pub reindex_time_ns: AtomicU64,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the end of a full reindex
    pub fn record_reindex(&self, _indexer_id: &str, result: ReindexResultKind, duration: Duration) {
        let counter = match result {
            ReindexResultKind::Completed => &self.reindex_completed,
            ReindexResultKind::Failed => &self.reindex_failed,
            ReindexResultKind::Skipped => &self.reindex_skipped,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.reindex_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Record rows handed to a row or list reindex
    pub fn record_rows_reindexed(&self, _indexer_id: &str, rows: usize) {
        self.rows_reindexed.fetch_add(rows as u64, Ordering::Relaxed);
    }

    /// Record an invalidation
    pub fn record_invalidation(&self, _indexer_id: &str) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record views suspended for one full reindex
    pub fn record_views_suspended(&self, _indexer_id: &str, views: usize) {
        self.views_suspended.fetch_add(views as u64, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            reindex_completed: self.reindex_completed.load(Ordering::Relaxed),
            reindex_failed: self.reindex_failed.load(Ordering::Relaxed),
            reindex_skipped: self.reindex_skipped.load(Ordering::Relaxed),
            rows_reindexed: self.rows_reindexed.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            views_suspended: self.views_suspended.load(Ordering::Relaxed),
            avg_reindex_ns: self.avg_reindex_time_ns(),
        }
    }

    /// Average time per full reindex call, skipped ones included
    pub fn avg_reindex_time_ns(&self) -> u64 {
        let total = self.reindex_time_ns.load(Ordering::Relaxed);
        let count = self.reindex_completed.load(Ordering::Relaxed)
            + self.reindex_failed.load(Ordering::Relaxed)
            + self.reindex_skipped.load(Ordering::Relaxed);
        if count > 0 {
            total / count
        } else {
            0
        }
    }
}

/// Point-in-time metrics snapshot
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Full reindexes that completed
    pub reindex_completed: u64,
    /// Full reindexes that failed
    pub reindex_failed: u64,
    /// Full reindexes skipped
    pub reindex_skipped: u64,
    /// Entity rows passed to row/list reindexing
    pub rows_reindexed: u64,
    /// Invalidations
    pub invalidations: u64,
    /// Views suspended around full reindexes
    pub views_suspended: u64,
    /// Average full reindex time in nanoseconds
    pub avg_reindex_ns: u64,
}

/// Trait for custom metrics recording implementations
///
/// Implement this trait to integrate with external metrics systems
/// like Prometheus.
pub trait MetricsRecorder: Send + Sync {
    /// Record the end of a full reindex
    fn record_reindex(&self, indexer_id: &str, result: ReindexResultKind, duration: Duration);

    /// Record rows handed to a row or list reindex
    fn record_rows_reindexed(&self, indexer_id: &str, rows: usize);

    /// Record an invalidation
    fn record_invalidation(&self, indexer_id: &str);

    /// Record views suspended for one full reindex
    fn record_views_suspended(&self, indexer_id: &str, views: usize);
}

/// No-op metrics recorder for when metrics are disabled
#[derive(Default)]
pub struct NoOpMetrics;

impl MetricsRecorder for NoOpMetrics {
    fn record_reindex(&self, _: &str, _: ReindexResultKind, _: Duration) {}
    fn record_rows_reindexed(&self, _: &str, _: usize) {}
    fn record_invalidation(&self, _: &str) {}
    fn record_views_suspended(&self, _: &str, _: usize) {}
}

impl MetricsRecorder for Metrics {
    fn record_reindex(&self, indexer_id: &str, result: ReindexResultKind, duration: Duration) {
        Metrics::record_reindex(self, indexer_id, result, duration);
    }

    fn record_rows_reindexed(&self, indexer_id: &str, rows: usize) {
        Metrics::record_rows_reindexed(self, indexer_id, rows);
    }

    fn record_invalidation(&self, indexer_id: &str) {
        Metrics::record_invalidation(self, indexer_id);
    }

    fn record_views_suspended(&self, indexer_id: &str, views: usize) {
        Metrics::record_views_suspended(self, indexer_id, views);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialization() {
        let snapshot = Metrics::new().snapshot();
        assert_eq!(snapshot, MetricsSnapshot::default());
    }

    #[test]
    fn test_record_reindex_outcomes() {
        let metrics = Metrics::new();

        metrics.record_reindex("a", ReindexResultKind::Completed, Duration::from_nanos(100));
        metrics.record_reindex("a", ReindexResultKind::Failed, Duration::from_nanos(200));
        metrics.record_reindex("b", ReindexResultKind::Skipped, Duration::from_nanos(0));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.reindex_completed, 1);
        assert_eq!(snapshot.reindex_failed, 1);
        assert_eq!(snapshot.reindex_skipped, 1);
        assert_eq!(snapshot.avg_reindex_ns, 100); // 300 / 3
    }

    #[test]
    fn test_rows_and_suspensions_accumulate() {
        let metrics = Metrics::new();
        metrics.record_rows_reindexed("a", 3);
        metrics.record_rows_reindexed("a", 1);
        metrics.record_views_suspended("a", 2);
        metrics.record_invalidation("a");

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.rows_reindexed, 4);
        assert_eq!(snapshot.views_suspended, 2);
        assert_eq!(snapshot.invalidations, 1);
    }

    #[test]
    fn test_noop_metrics() {
        let metrics = NoOpMetrics;
        metrics.record_reindex("a", ReindexResultKind::Completed, Duration::ZERO);
        metrics.record_rows_reindexed("a", 1);
        metrics.record_invalidation("a");
        metrics.record_views_suspended("a", 1);
    }
}

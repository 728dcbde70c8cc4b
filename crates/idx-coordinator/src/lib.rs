//! # Indexer Coordinator
//!
//! Invalidation and scheduling for derived-data indexers.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Keep every configured indexer's materialized data consistent with its
//! sources:
//! - Status machine per indexer (valid / invalid / working / suspended)
//! - Static dependency graph with run-before / run-after closure
//! - Change-log ("view") suspension around full rebuilds, coordinated across
//!   indexers that share one physical index
//!
//! ## Guarantees
//!
//! | Property | Mechanism |
//! |----------|-----------|
//! | No duplicate full rebuild | `WorkingStateProvider` check (advisory, not a lock) |
//! | Views always resumed | `ViewSuspension` guard, released on every exit path |
//! | Failures surface | Action errors are returned after cleanup, status INVALID |
//! | Cycles terminate | Graph walk tracks the current path |
//!
//! ## Module Structure
//!
//! ```text
//! idx-coordinator/
//! ├── domain/          # Status enums, entities, static config, errors
//! ├── ports/           # IndexerApi + collaborator traits
//! ├── algorithms/      # Dependency graph, changelog freshness
//! ├── service/         # Indexer, IndexerRegistry, ViewSuspension
//! ├── adapters/        # Document store, command action, mock action
//! └── metrics.rs       # Counters + MetricsRecorder
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{
    CommandActionFactory, DocumentStore, JsonFileBackend, MemoryBackend, MockActionFactory,
    StoreWorkingStateProvider,
};
pub use algorithms::{backlog, is_view_up_to_date, DependencyInfoProvider};
pub use domain::{
    ActionError, EntityId, IndexerConfigSet, IndexerDefinition, IndexerError, IndexerId,
    IndexerMode, IndexerResult, IndexerState, IndexerStatus, StoreError, ViewError, ViewId,
    ViewMode, ViewState, ViewStatus,
};
pub use metrics::{Metrics, MetricsRecorder, MetricsSnapshot, NoOpMetrics, ReindexResultKind};
pub use ports::{
    ActionFactory, IndexerAction, IndexerApi, IndexerStateStore, ReindexOutcome, View,
    ViewRepository, WorkingStateProvider,
};
pub use service::{
    BatchResults, BatchStep, BatchStepOutcome, Indexer, IndexerContext, IndexerRegistry,
    IndexerStatusRow, ReindexReport, ViewSuspension,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}

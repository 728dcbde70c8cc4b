//! # Indexer Context
//!
//! The collaborators every indexer needs, injected once at construction.

use crate::domain::IndexerConfigSet;
use crate::metrics::{MetricsRecorder, NoOpMetrics};
use crate::ports::{ActionFactory, IndexerStateStore, ViewRepository, WorkingStateProvider};
use std::sync::Arc;

/// Shared collaborators of the indexers of one process.
pub struct IndexerContext {
    pub(crate) config: Arc<IndexerConfigSet>,
    pub(crate) state_store: Arc<dyn IndexerStateStore>,
    pub(crate) working_state: Arc<dyn WorkingStateProvider>,
    pub(crate) views: Arc<dyn ViewRepository>,
    pub(crate) actions: Arc<dyn ActionFactory>,
    pub(crate) metrics: Arc<dyn MetricsRecorder>,
}

impl IndexerContext {
    /// Context with metrics disabled.
    pub fn new(
        config: Arc<IndexerConfigSet>,
        state_store: Arc<dyn IndexerStateStore>,
        working_state: Arc<dyn WorkingStateProvider>,
        views: Arc<dyn ViewRepository>,
        actions: Arc<dyn ActionFactory>,
    ) -> Self {
        Self {
            config,
            state_store,
            working_state,
            views,
            actions,
            metrics: Arc::new(NoOpMetrics),
        }
    }

    /// Builder: record metrics through `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsRecorder>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Static configuration.
    pub fn config(&self) -> &IndexerConfigSet {
        &self.config
    }

    /// View repository.
    pub fn views(&self) -> &Arc<dyn ViewRepository> {
        &self.views
    }

    /// Indexer state store.
    pub fn state_store(&self) -> &Arc<dyn IndexerStateStore> {
        &self.state_store
    }
}

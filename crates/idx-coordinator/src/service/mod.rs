//! # Service Layer
//!
//! The indexer façade, batch operations over all indexers, and the view
//! suspension guard used around full rebuilds.

pub mod context;
pub mod indexer;
pub mod registry;
pub mod suspension;

pub use context::IndexerContext;
pub use indexer::Indexer;
pub use registry::{
    BatchResults, BatchStep, BatchStepOutcome, IndexerRegistry, IndexerStatusRow, ReindexReport,
};
pub use suspension::ViewSuspension;

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::adapters::{DocumentStore, MemoryBackend, MockActionFactory, StoreWorkingStateProvider};
    use crate::domain::{IndexerConfigSet, IndexerDefinition, IndexerState, IndexerStatus};
    use crate::ports::IndexerStateStore;
    use std::sync::Arc;

    pub(crate) struct TestHarness {
        pub ctx: Arc<IndexerContext>,
        pub store: DocumentStore<MemoryBackend>,
        pub actions: MockActionFactory,
    }

    impl TestHarness {
        pub fn new(definitions: Vec<IndexerDefinition>) -> Self {
            let config = Arc::new(IndexerConfigSet::from_definitions(definitions).unwrap());
            let store = DocumentStore::in_memory();
            let actions = MockActionFactory::new();
            let state_store: Arc<dyn IndexerStateStore> = Arc::new(store.clone());
            let ctx = IndexerContext::new(
                config,
                state_store.clone(),
                Arc::new(StoreWorkingStateProvider::new(state_store)),
                Arc::new(store.clone()),
                Arc::new(actions.clone()),
            );
            Self {
                ctx: Arc::new(ctx),
                store,
                actions,
            }
        }

        pub fn indexer(&self, id: &str) -> Indexer {
            Indexer::load(self.ctx.clone(), id).unwrap()
        }

        /// Write a status straight into the store, bypassing transitions.
        pub fn set_stored_status(&self, id: &str, status: IndexerStatus) {
            let mut state = IndexerState::new(id);
            state.status = status;
            state.touch();
            self.store.save(&state).unwrap();
        }
    }
}

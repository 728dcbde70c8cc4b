//! # Working State Provider
//!
//! Reads the persisted indexer status fresh on every call.

use crate::domain::{IndexerStatus, StoreError};
use crate::ports::{IndexerStateStore, WorkingStateProvider};
use std::sync::Arc;

/// `WorkingStateProvider` over an indexer state store.
pub struct StoreWorkingStateProvider {
    store: Arc<dyn IndexerStateStore>,
}

impl StoreWorkingStateProvider {
    /// Provider reading from `store`.
    pub fn new(store: Arc<dyn IndexerStateStore>) -> Self {
        Self { store }
    }
}

impl WorkingStateProvider for StoreWorkingStateProvider {
    fn is_working(&self, indexer_id: &str) -> Result<bool, StoreError> {
        Ok(self.store.load(indexer_id)?.status == IndexerStatus::Working)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::DocumentStore;
    use crate::domain::IndexerState;

    #[test]
    fn test_reads_persisted_status() {
        let store = Arc::new(DocumentStore::in_memory());
        let provider = StoreWorkingStateProvider::new(store.clone());
        assert!(!provider.is_working("x").unwrap());

        let mut state = IndexerState::new("x");
        state.set_status(IndexerStatus::Working).unwrap();
        store.save(&state).unwrap();
        assert!(provider.is_working("x").unwrap());
    }
}

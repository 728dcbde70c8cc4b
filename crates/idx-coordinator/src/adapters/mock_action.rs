//! # Mock Action
//!
//! Counting action with injectable failure, for tests and dry runs.

use crate::domain::{ActionError, EntityId, IndexerDefinition};
use crate::ports::{ActionFactory, IndexerAction};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Calls observed for one indexer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActionCalls {
    /// `execute_full` calls.
    pub full: usize,
    /// Rows passed to `execute_row`.
    pub rows: Vec<EntityId>,
    /// Lists passed to `execute_list`.
    pub lists: Vec<Vec<EntityId>>,
}

type Hook = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Default)]
struct Shared {
    calls: Mutex<HashMap<String, ActionCalls>>,
    failing: Mutex<HashSet<String>>,
    on_full: Mutex<Option<Hook>>,
}

/// Factory handing out `MockAction`s that record into shared counters.
#[derive(Clone, Default)]
pub struct MockActionFactory {
    shared: Arc<Shared>,
}

impl MockActionFactory {
    /// Factory whose actions all succeed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every action of `indexer_id` fail.
    pub fn fail(&self, indexer_id: &str) {
        self.shared.failing.lock().insert(indexer_id.to_string());
    }

    /// Make actions of `indexer_id` succeed again.
    pub fn heal(&self, indexer_id: &str) {
        self.shared.failing.lock().remove(indexer_id);
    }

    /// Run `hook` inside every `execute_full`, before it returns.
    pub fn on_full(&self, hook: impl Fn(&str) + Send + Sync + 'static) {
        *self.shared.on_full.lock() = Some(Arc::new(hook));
    }

    /// Calls recorded for `indexer_id`.
    pub fn calls(&self, indexer_id: &str) -> ActionCalls {
        self.shared
            .calls
            .lock()
            .get(indexer_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of `execute_full` calls for `indexer_id`.
    pub fn full_count(&self, indexer_id: &str) -> usize {
        self.calls(indexer_id).full
    }
}

impl ActionFactory for MockActionFactory {
    fn create(&self, definition: &IndexerDefinition) -> Box<dyn IndexerAction> {
        Box::new(MockAction {
            indexer_id: definition.id.clone(),
            shared: Arc::clone(&self.shared),
        })
    }
}

/// Action created by `MockActionFactory`.
pub struct MockAction {
    indexer_id: String,
    shared: Arc<Shared>,
}

impl MockAction {
    fn record(&self, f: impl FnOnce(&mut ActionCalls)) -> Result<(), ActionError> {
        f(self
            .shared
            .calls
            .lock()
            .entry(self.indexer_id.clone())
            .or_default());
        if self.shared.failing.lock().contains(&self.indexer_id) {
            return Err(ActionError::new(&self.indexer_id, "mock action failure"));
        }
        Ok(())
    }
}

impl IndexerAction for MockAction {
    fn execute_full(&self) -> Result<(), ActionError> {
        self.record(|c| c.full += 1)?;
        let hook = self.shared.on_full.lock().clone();
        if let Some(hook) = hook {
            hook(&self.indexer_id);
        }
        Ok(())
    }

    fn execute_row(&self, id: EntityId) -> Result<(), ActionError> {
        self.record(|c| c.rows.push(id))
    }

    fn execute_list(&self, ids: &[EntityId]) -> Result<(), ActionError> {
        self.record(|c| c.lists.push(ids.to_vec()))
    }
}

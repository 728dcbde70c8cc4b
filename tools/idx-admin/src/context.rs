//! Adapter wiring for one CLI invocation.

use anyhow::Context;
use idx_coordinator::{
    CommandActionFactory, DocumentStore, IndexerConfigSet, IndexerContext, IndexerRegistry,
    IndexerStateStore, JsonFileBackend, MetricsRecorder, StoreWorkingStateProvider,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Registry over the JSON state document, running actions as commands.
pub struct AdminContext {
    store: DocumentStore<JsonFileBackend>,
    registry: IndexerRegistry,
}

impl AdminContext {
    /// Load `config_path` and open the state document at `state_path`.
    ///
    /// Actions run from the directory holding the config file.
    pub fn open(
        config_path: &Path,
        state_path: &Path,
        metrics: Arc<dyn MetricsRecorder>,
    ) -> anyhow::Result<Self> {
        let config = IndexerConfigSet::load(config_path)
            .with_context(|| format!("loading indexer config {}", config_path.display()))?;

        let working_dir = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let store = DocumentStore::open(state_path);
        let state_store: Arc<dyn IndexerStateStore> = Arc::new(store.clone());
        let ctx = IndexerContext::new(
            Arc::new(config),
            state_store.clone(),
            Arc::new(StoreWorkingStateProvider::new(state_store)),
            Arc::new(store.clone()),
            Arc::new(CommandActionFactory::new().with_working_dir(working_dir)),
        )
        .with_metrics(metrics);

        let registry = IndexerRegistry::new(Arc::new(ctx))?;
        Ok(Self { store, registry })
    }

    /// All indexers.
    pub fn registry(&self) -> &IndexerRegistry {
        &self.registry
    }

    /// The state document.
    pub fn store(&self) -> &DocumentStore<JsonFileBackend> {
        &self.store
    }
}

//! # Document Store Adapter
//!
//! Indexer state, view state and changelogs kept in one serializable
//! document. Two backends:
//!
//! - `MemoryBackend`: the document behind a mutex (tests, embedding)
//! - `JsonFileBackend`: a JSON file guarded by an exclusive `fs2` lock file,
//!   rewritten through a temp file and an atomic rename
//!
//! Each read-modify-write is atomic with respect to other processes using
//! the same file. Nothing spans two calls.

use crate::domain::{
    EntityId, IndexerState, StoreError, ViewError, ViewId, ViewMode, ViewState, ViewStatus,
};
use crate::ports::{IndexerStateStore, View, ViewRepository};
use chrono::Utc;
use fs2::FileExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

// =============================================================================
// DOCUMENT
// =============================================================================

/// One changelog row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogEntry {
    /// Version the change was recorded under.
    pub version: u64,
    /// Changed entity.
    pub entity_id: EntityId,
}

/// Change-data-capture log of one view.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changelog {
    /// Latest recorded version. 0 for an empty changelog.
    pub version: u64,
    /// Recorded rows, ascending by version.
    #[serde(default)]
    pub entries: Vec<ChangelogEntry>,
}

/// Everything the coordinator persists.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateDocument {
    /// Indexer states by indexer id.
    #[serde(default)]
    pub indexers: BTreeMap<String, IndexerState>,
    /// View states by view id.
    #[serde(default)]
    pub views: BTreeMap<ViewId, ViewState>,
    /// Changelogs by view id. Absent until the view is first subscribed.
    #[serde(default)]
    pub changelogs: BTreeMap<ViewId, Changelog>,
}

impl StateDocument {
    fn view_state(&self, view_id: &str) -> ViewState {
        self.views
            .get(view_id)
            .cloned()
            .unwrap_or_else(|| ViewState::new(view_id))
    }

    fn changelog_version(&self, view_id: &str) -> Result<u64, ViewError> {
        self.changelogs
            .get(view_id)
            .map(|c| c.version)
            .ok_or_else(|| ViewError::ChangelogMissing {
                view_id: view_id.to_string(),
            })
    }

    fn put_view(&mut self, mut state: ViewState) {
        state.updated = Some(Utc::now());
        self.views.insert(state.view_id.clone(), state);
    }
}

// =============================================================================
// BACKENDS
// =============================================================================

/// Storage for the state document.
pub trait DocumentBackend: Send + Sync + 'static {
    /// Snapshot of the current document.
    fn read(&self) -> Result<StateDocument, StoreError>;

    /// Apply `f` to the document and persist it if `f` succeeds.
    fn update<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut StateDocument) -> Result<T, E>,
        E: From<StoreError>;
}

/// In-process document.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    document: Mutex<StateDocument>,
}

impl DocumentBackend for MemoryBackend {
    fn read(&self) -> Result<StateDocument, StoreError> {
        Ok(self.document.lock().clone())
    }

    fn update<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut StateDocument) -> Result<T, E>,
        E: From<StoreError>,
    {
        let mut guard = self.document.lock();
        let mut draft = guard.clone();
        let value = f(&mut draft)?;
        *guard = draft;
        Ok(value)
    }
}

/// JSON file on disk.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
    lock_path: PathBuf,
}

/// Lock on the state file, released on drop.
struct StateFileLock {
    file: File,
}

impl Drop for StateFileLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

impl JsonFileBackend {
    /// Backend for the document at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = path.with_extension("lock");
        Self { path, lock_path }
    }

    /// Path of the state document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(path: &Path, error: io::Error) -> StoreError {
        StoreError::Io {
            path: path.to_path_buf(),
            error,
        }
    }

    fn lock(&self, exclusive: bool) -> Result<StateFileLock, StoreError> {
        if let Some(parent) = self.lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Self::io_error(parent, e))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)
            .map_err(|e| Self::io_error(&self.lock_path, e))?;
        let locked = if exclusive {
            FileExt::lock_exclusive(&file)
        } else {
            FileExt::lock_shared(&file)
        };
        locked.map_err(|e| StoreError::Lock(format!("{}: {}", self.lock_path.display(), e)))?;
        Ok(StateFileLock { file })
    }

    fn load_unlocked(&self) -> Result<StateDocument, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(StateDocument::default()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(StateDocument::default()),
            Err(e) => Err(Self::io_error(&self.path, e)),
        }
    }

    fn store_unlocked(&self, document: &StateDocument) -> Result<(), StoreError> {
        let encoded = serde_json::to_vec_pretty(document)?;
        let tmp_path = self.path.with_extension("json.tmp");
        let mut tmp = File::create(&tmp_path).map_err(|e| Self::io_error(&tmp_path, e))?;
        tmp.write_all(&encoded)
            .and_then(|_| tmp.sync_all())
            .map_err(|e| Self::io_error(&tmp_path, e))?;
        fs::rename(&tmp_path, &self.path).map_err(|e| Self::io_error(&self.path, e))?;
        debug!(path = %self.path.display(), bytes = encoded.len(), "State document written");
        Ok(())
    }
}

impl DocumentBackend for JsonFileBackend {
    fn read(&self) -> Result<StateDocument, StoreError> {
        let _lock = self.lock(false)?;
        self.load_unlocked()
    }

    fn update<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut StateDocument) -> Result<T, E>,
        E: From<StoreError>,
    {
        let _lock = self.lock(true)?;
        let mut document = self.load_unlocked()?;
        let value = f(&mut document)?;
        self.store_unlocked(&document)?;
        Ok(value)
    }
}

// =============================================================================
// STORE
// =============================================================================

/// State store and view repository over one document backend.
#[derive(Debug)]
pub struct DocumentStore<B: DocumentBackend> {
    backend: Arc<B>,
}

impl<B: DocumentBackend> Clone for DocumentStore<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl DocumentStore<MemoryBackend> {
    /// Empty in-memory store.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::default())
    }
}

impl DocumentStore<JsonFileBackend> {
    /// Store backed by the JSON file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(JsonFileBackend::new(path))
    }
}

impl<B: DocumentBackend> DocumentStore<B> {
    /// Store over the given backend.
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Snapshot of the whole document.
    pub fn snapshot(&self) -> Result<StateDocument, StoreError> {
        self.backend.read()
    }

    /// Append one changelog version containing `ids`. Returns the new version.
    ///
    /// Creates the changelog if it does not exist.
    pub fn record_change(&self, view_id: &str, ids: &[EntityId]) -> Result<u64, StoreError> {
        self.backend.update(|doc| {
            let changelog = doc.changelogs.entry(view_id.to_string()).or_default();
            changelog.version += 1;
            let version = changelog.version;
            changelog.entries.extend(ids.iter().map(|&entity_id| ChangelogEntry {
                version,
                entity_id,
            }));
            Ok::<_, StoreError>(version)
        })
    }

    /// Overwrite a view state as given.
    pub fn put_view_state(&self, state: &ViewState) -> Result<(), StoreError> {
        self.backend.update(|doc| {
            doc.views.insert(state.view_id.clone(), state.clone());
            Ok::<_, StoreError>(())
        })
    }
}

impl<B: DocumentBackend> IndexerStateStore for DocumentStore<B> {
    fn load(&self, indexer_id: &str) -> Result<IndexerState, StoreError> {
        let document = self.backend.read()?;
        Ok(document
            .indexers
            .get(indexer_id)
            .cloned()
            .unwrap_or_else(|| IndexerState::new(indexer_id)))
    }

    fn save(&self, state: &IndexerState) -> Result<(), StoreError> {
        debug!(indexer_id = %state.indexer_id, status = %state.status, "Saving indexer state");
        self.backend.update(|doc| {
            doc.indexers.insert(state.indexer_id.clone(), state.clone());
            Ok::<_, StoreError>(())
        })
    }
}

impl<B: DocumentBackend> ViewRepository for DocumentStore<B> {
    fn view(&self, view_id: &str) -> Arc<dyn View> {
        Arc::new(DocumentView {
            view_id: view_id.to_string(),
            backend: Arc::clone(&self.backend),
        })
    }
}

// =============================================================================
// VIEW
// =============================================================================

/// Changelog view persisted in a document store.
#[derive(Debug)]
pub struct DocumentView<B: DocumentBackend> {
    view_id: ViewId,
    backend: Arc<B>,
}

impl<B: DocumentBackend> DocumentView<B> {
    fn modify<F>(&self, f: F) -> Result<(), ViewError>
    where
        F: FnOnce(&mut StateDocument, &mut ViewState) -> Result<bool, ViewError>,
    {
        self.backend.update(|doc| {
            let mut state = doc.view_state(&self.view_id);
            if f(doc, &mut state)? {
                doc.put_view(state);
            }
            Ok(())
        })
    }
}

impl<B: DocumentBackend> View for DocumentView<B> {
    fn id(&self) -> &str {
        &self.view_id
    }

    fn state(&self) -> Result<ViewState, ViewError> {
        Ok(self.backend.read()?.view_state(&self.view_id))
    }

    fn subscribe(&self) -> Result<(), ViewError> {
        self.modify(|doc, state| {
            if state.is_enabled() {
                return Ok(false);
            }
            let version = doc
                .changelogs
                .entry(self.view_id.clone())
                .or_default()
                .version;
            state.mode = ViewMode::Enabled;
            // Start from the current head: realtime mode covered everything before it.
            state.version_id.get_or_insert(version);
            debug!(view_id = %self.view_id, version, "View subscribed");
            Ok(true)
        })
    }

    fn unsubscribe(&self) -> Result<(), ViewError> {
        self.modify(|_, state| {
            if !state.is_enabled() {
                return Ok(false);
            }
            state.mode = ViewMode::Disabled;
            debug!(view_id = %self.view_id, "View unsubscribed");
            Ok(true)
        })
    }

    fn suspend(&self) -> Result<(), ViewError> {
        self.modify(|doc, state| {
            if !state.is_enabled() {
                return Ok(false);
            }
            let version = doc.changelog_version(&self.view_id)?;
            state.version_id = Some(version);
            state.status = ViewStatus::Suspended;
            debug!(view_id = %self.view_id, version, "View suspended with watermark reset");
            Ok(true)
        })
    }

    fn mark_suspended(&self) -> Result<(), ViewError> {
        self.modify(|_, state| {
            if !state.is_enabled() {
                return Ok(false);
            }
            state.status = ViewStatus::Suspended;
            debug!(view_id = %self.view_id, "View marked suspended");
            Ok(true)
        })
    }

    fn resume(&self) -> Result<(), ViewError> {
        self.modify(|_, state| {
            if state.status != ViewStatus::Suspended {
                return Ok(false);
            }
            state.status = ViewStatus::Idle;
            debug!(view_id = %self.view_id, "View resumed");
            Ok(true)
        })
    }

    fn changelog_version(&self) -> Result<u64, ViewError> {
        self.backend.read()?.changelog_version(&self.view_id)
    }

    fn changed_ids(
        &self,
        from_exclusive: u64,
        to_inclusive: u64,
    ) -> Result<Vec<EntityId>, ViewError> {
        let document = self.backend.read()?;
        let changelog =
            document
                .changelogs
                .get(&self.view_id)
                .ok_or_else(|| ViewError::ChangelogMissing {
                    view_id: self.view_id.clone(),
                })?;
        let ids: BTreeSet<EntityId> = changelog
            .entries
            .iter()
            .filter(|e| e.version > from_exclusive && e.version <= to_inclusive)
            .map(|e| e.entity_id)
            .collect();
        Ok(ids.into_iter().collect())
    }

    fn set_status(&self, status: ViewStatus) -> Result<(), ViewError> {
        self.modify(|_, state| {
            state.status = status;
            Ok(true)
        })
    }

    fn set_version_id(&self, version_id: u64) -> Result<(), ViewError> {
        self.modify(|_, state| {
            state.version_id = Some(version_id);
            Ok(true)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IndexerStatus;

    #[test]
    fn test_missing_indexer_loads_invalid() {
        let store = DocumentStore::in_memory();
        let state = store.load("catalog_rule_product").unwrap();
        assert_eq!(state.status, IndexerStatus::Invalid);
        assert!(state.updated.is_none());
    }

    #[test]
    fn test_save_and_load_indexer_state() {
        let store = DocumentStore::in_memory();
        let mut state = IndexerState::new("x");
        state.set_status(IndexerStatus::Valid).unwrap();
        state.touch();
        store.save(&state).unwrap();
        assert_eq!(store.load("x").unwrap(), state);
    }

    #[test]
    fn test_subscribe_creates_changelog_and_sets_watermark() {
        let store = DocumentStore::in_memory();
        let view = store.view("v");
        assert!(view.changelog_version().is_err());
        view.subscribe().unwrap();
        let state = view.state().unwrap();
        assert!(state.is_enabled());
        assert_eq!(state.version_id, Some(0));
        assert_eq!(view.changelog_version().unwrap(), 0);
    }

    #[test]
    fn test_suspend_fast_forwards_watermark() {
        let store = DocumentStore::in_memory();
        let view = store.view("v");
        view.subscribe().unwrap();
        store.record_change("v", &[10, 11]).unwrap();
        store.record_change("v", &[11]).unwrap();
        view.suspend().unwrap();
        let state = view.state().unwrap();
        assert_eq!(state.status, ViewStatus::Suspended);
        assert_eq!(state.version_id, Some(2));

        view.resume().unwrap();
        assert_eq!(view.state().unwrap().status, ViewStatus::Idle);
    }

    #[test]
    fn test_mark_suspended_keeps_watermark() {
        let store = DocumentStore::in_memory();
        let view = store.view("v");
        view.subscribe().unwrap();
        store.record_change("v", &[1]).unwrap();
        view.mark_suspended().unwrap();
        let state = view.state().unwrap();
        assert_eq!(state.status, ViewStatus::Suspended);
        assert_eq!(state.version_id, Some(0));
    }

    #[test]
    fn test_suspend_is_noop_when_disabled() {
        let store = DocumentStore::in_memory();
        let view = store.view("v");
        view.suspend().unwrap();
        view.mark_suspended().unwrap();
        assert_eq!(view.state().unwrap().status, ViewStatus::Idle);
    }

    #[test]
    fn test_resume_is_noop_unless_suspended() {
        let store = DocumentStore::in_memory();
        let view = store.view("v");
        view.subscribe().unwrap();
        view.set_status(ViewStatus::Working).unwrap();
        view.resume().unwrap();
        assert_eq!(view.state().unwrap().status, ViewStatus::Working);
    }

    #[test]
    fn test_changed_ids_range_is_distinct_and_sorted() {
        let store = DocumentStore::in_memory();
        store.record_change("v", &[5, 3]).unwrap();
        store.record_change("v", &[3, 7]).unwrap();
        store.record_change("v", &[9]).unwrap();
        let view = store.view("v");
        assert_eq!(view.changed_ids(0, 2).unwrap(), vec![3, 5, 7]);
        assert_eq!(view.changed_ids(1, 3).unwrap(), vec![3, 7, 9]);
    }

    #[test]
    fn test_failed_update_leaves_document_unchanged() {
        let store = DocumentStore::in_memory();
        let view = store.view("v");
        let mut state = ViewState::new("v");
        state.mode = ViewMode::Enabled;
        store.put_view_state(&state).unwrap();
        // No changelog yet, so suspend fails and nothing is written.
        assert!(matches!(
            view.suspend(),
            Err(ViewError::ChangelogMissing { .. })
        ));
        assert_eq!(view.state().unwrap().status, ViewStatus::Idle);
    }

    #[test]
    fn test_json_backend_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("var").join("indexer_state.json");

        let store = DocumentStore::open(&path);
        let mut state = IndexerState::new("x");
        state.set_status(IndexerStatus::Valid).unwrap();
        store.save(&state).unwrap();
        store.view("x").subscribe().unwrap();
        store.record_change("x", &[42]).unwrap();

        let reopened = DocumentStore::open(&path);
        assert_eq!(reopened.load("x").unwrap().status, IndexerStatus::Valid);
        let view = reopened.view("x");
        assert!(view.is_enabled().unwrap());
        assert_eq!(view.changelog_version().unwrap(), 1);
        assert_eq!(view.changed_ids(0, 1).unwrap(), vec![42]);
    }

    #[test]
    fn test_json_backend_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{ not json").unwrap();
        let store = DocumentStore::open(&path);
        assert!(matches!(
            store.load("x"),
            Err(StoreError::Serialization(_))
        ));
    }
}

//! # Outbound Ports
//!
//! Traits for the coordinator's collaborators: state store, changelog views
//! and the actions that materialize index data.
//!
//! All ports are synchronous. A reindex runs on one call stack.

use crate::domain::{
    ActionError, EntityId, IndexerDefinition, IndexerState, StoreError, ViewError, ViewState,
    ViewStatus,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Persistent indexer state - outbound port.
pub trait IndexerStateStore: Send + Sync {
    /// Load the state of an indexer. A missing row loads as INVALID.
    fn load(&self, indexer_id: &str) -> Result<IndexerState, StoreError>;

    /// Persist the state as given.
    fn save(&self, state: &IndexerState) -> Result<(), StoreError>;
}

/// Re-entrancy check for full reindex - outbound port.
///
/// Advisory only: there is no lock between the check and the WORKING save,
/// so two processes racing past the check will both rebuild. True mutual
/// exclusion needs an external lock.
pub trait WorkingStateProvider: Send + Sync {
    /// Whether the persisted status of the indexer is WORKING.
    fn is_working(&self, indexer_id: &str) -> Result<bool, StoreError>;
}

/// Changelog view lookup - outbound port.
pub trait ViewRepository: Send + Sync {
    /// View handle by id. Unknown views start disabled.
    fn view(&self, view_id: &str) -> Arc<dyn View>;
}

/// Change-data-capture view - outbound port.
pub trait View: Send + Sync {
    /// View id.
    fn id(&self) -> &str;

    /// Current persisted view state.
    fn state(&self) -> Result<ViewState, ViewError>;

    /// Whether the view is subscribed.
    fn is_enabled(&self) -> Result<bool, ViewError> {
        Ok(self.state()?.is_enabled())
    }

    /// Last save time of the view state.
    fn updated(&self) -> Result<Option<DateTime<Utc>>, ViewError> {
        Ok(self.state()?.updated)
    }

    /// Create the changelog if needed and enable the view.
    fn subscribe(&self) -> Result<(), ViewError>;

    /// Disable the view.
    fn unsubscribe(&self) -> Result<(), ViewError>;

    /// Fast-forward the watermark to the changelog version and mark SUSPENDED.
    /// No-op when disabled.
    fn suspend(&self) -> Result<(), ViewError>;

    /// Mark SUSPENDED without moving the watermark. No-op when disabled.
    fn mark_suspended(&self) -> Result<(), ViewError>;

    /// SUSPENDED -> IDLE. No-op in any other status.
    fn resume(&self) -> Result<(), ViewError>;

    /// Current changelog version.
    ///
    /// Fails `ChangelogMissing` when the changelog was never created.
    fn changelog_version(&self) -> Result<u64, ViewError>;

    /// Distinct entity ids changed in `(from_exclusive, to_inclusive]`.
    fn changed_ids(
        &self,
        from_exclusive: u64,
        to_inclusive: u64,
    ) -> Result<Vec<EntityId>, ViewError>;

    /// Persist a new processing status.
    fn set_status(&self, status: ViewStatus) -> Result<(), ViewError>;

    /// Persist a new watermark.
    fn set_version_id(&self, version_id: u64) -> Result<(), ViewError>;
}

/// Action construction - outbound port.
pub trait ActionFactory: Send + Sync {
    /// Action for the given indexer.
    fn create(&self, definition: &IndexerDefinition) -> Box<dyn IndexerAction>;
}

/// Opaque data materialization - outbound port.
pub trait IndexerAction: Send {
    /// Rebuild everything.
    fn execute_full(&self) -> Result<(), ActionError>;

    /// Rebuild one row.
    fn execute_row(&self, id: EntityId) -> Result<(), ActionError>;

    /// Rebuild a list of rows.
    fn execute_list(&self, ids: &[EntityId]) -> Result<(), ActionError>;
}

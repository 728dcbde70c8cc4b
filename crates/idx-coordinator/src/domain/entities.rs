//! # Domain Entities
//!
//! Persisted indexer and view state, and the static indexer definition.

use crate::domain::errors::{IndexerError, IndexerId, IndexerResult, ViewId};
use crate::domain::status::{IndexerStatus, ViewMode, ViewStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted status of one indexer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexerState {
    /// Indexer id.
    pub indexer_id: IndexerId,
    /// Current status.
    pub status: IndexerStatus,
    /// Time of the last save.
    pub updated: Option<DateTime<Utc>>,
}

impl IndexerState {
    /// State of an indexer that was never saved.
    pub fn new(indexer_id: impl Into<IndexerId>) -> Self {
        Self {
            indexer_id: indexer_id.into(),
            status: IndexerStatus::Invalid,
            updated: None,
        }
    }

    /// Change status, enforcing the transition rules.
    pub fn set_status(&mut self, next: IndexerStatus) -> IndexerResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(IndexerError::InvalidTransition {
                indexer_id: self.indexer_id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Stamp the save time.
    pub fn touch(&mut self) {
        self.updated = Some(Utc::now());
    }
}

/// Persisted state of a changelog view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    /// View id.
    pub view_id: ViewId,
    /// Subscription mode.
    pub mode: ViewMode,
    /// Processing status.
    pub status: ViewStatus,
    /// Last changelog version applied. `None` until the first catch-up.
    pub version_id: Option<u64>,
    /// Time of the last save.
    pub updated: Option<DateTime<Utc>>,
}

impl ViewState {
    /// State of a view that was never subscribed.
    pub fn new(view_id: impl Into<ViewId>) -> Self {
        Self {
            view_id: view_id.into(),
            mode: ViewMode::Disabled,
            status: ViewStatus::Idle,
            version_id: None,
            updated: None,
        }
    }

    /// Whether the view is subscribed.
    pub fn is_enabled(&self) -> bool {
        self.mode == ViewMode::Enabled
    }
}

/// Static definition of an indexer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexerDefinition {
    /// Unique indexer id.
    pub id: IndexerId,
    /// Human-readable title.
    #[serde(default)]
    pub title: String,
    /// Description shown by `info`.
    #[serde(default)]
    pub description: String,
    /// Changelog view id. Defaults to the indexer id.
    #[serde(default)]
    pub view_id: Option<ViewId>,
    /// Action implementation reference.
    pub action_class: String,
    /// Shared physical index group.
    #[serde(default)]
    pub shared_index: Option<String>,
    /// Ids that must run before this indexer.
    #[serde(default)]
    pub dependencies: Vec<IndexerId>,
}

impl IndexerDefinition {
    /// Definition with just an id and action.
    pub fn new(id: impl Into<IndexerId>, action_class: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            title: id.clone(),
            id,
            description: String::new(),
            view_id: None,
            action_class: action_class.into(),
            shared_index: None,
            dependencies: Vec::new(),
        }
    }

    /// Builder: add dependencies.
    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<IndexerId>,
    {
        self.dependencies.extend(deps.into_iter().map(Into::into));
        self
    }

    /// Builder: set shared index group.
    pub fn with_shared_index(mut self, group: impl Into<String>) -> Self {
        self.shared_index = Some(group.into());
        self
    }

    /// Builder: set view id.
    pub fn with_view_id(mut self, view_id: impl Into<ViewId>) -> Self {
        self.view_id = Some(view_id.into());
        self
    }

    /// Effective view id.
    pub fn view_id(&self) -> &str {
        self.view_id.as_deref().unwrap_or(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_invalid_without_timestamp() {
        let state = IndexerState::new("catalog_category_product");
        assert_eq!(state.status, IndexerStatus::Invalid);
        assert!(state.updated.is_none());
    }

    #[test]
    fn test_set_status_rejects_invalid_transition() {
        let mut state = IndexerState::new("x");
        state.set_status(IndexerStatus::Suspended).unwrap();
        let err = state.set_status(IndexerStatus::Working).unwrap_err();
        assert!(matches!(err, IndexerError::InvalidTransition { .. }));
        assert_eq!(state.status, IndexerStatus::Suspended);
    }

    #[test]
    fn test_touch_stamps_updated() {
        let mut state = IndexerState::new("x");
        state.touch();
        assert!(state.updated.is_some());
    }

    #[test]
    fn test_view_id_defaults_to_indexer_id() {
        let def = IndexerDefinition::new("catalogsearch_fulltext", "bin/fulltext");
        assert_eq!(def.view_id(), "catalogsearch_fulltext");
        let def = def.with_view_id("catalogsearch_fulltext_cl");
        assert_eq!(def.view_id(), "catalogsearch_fulltext_cl");
    }

    #[test]
    fn test_new_view_is_disabled_and_idle() {
        let view = ViewState::new("v");
        assert!(!view.is_enabled());
        assert_eq!(view.status, ViewStatus::Idle);
        assert_eq!(view.version_id, None);
    }
}

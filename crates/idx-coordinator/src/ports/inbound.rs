//! # Inbound Ports
//!
//! API trait defining what a single indexer can do.

use crate::domain::{EntityId, IndexerResult, IndexerStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of a full reindex request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReindexOutcome {
    /// The action ran and the indexer ended VALID (or was invalidated meanwhile).
    Completed,
    /// Another run holds the indexer in WORKING; nothing was done.
    SkippedWorking,
    /// The indexer is SUSPENDED by an operator; nothing was done.
    SkippedSuspended,
}

impl ReindexOutcome {
    /// Whether the action actually ran.
    pub fn ran(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Indexer API - inbound port.
pub trait IndexerApi: Send + Sync {
    /// Indexer id.
    fn id(&self) -> &str;

    /// Human-readable title.
    fn title(&self) -> &str;

    /// Description.
    fn description(&self) -> &str;

    /// Effective status, WORKING while a changelog catch-up is running.
    fn status(&self) -> IndexerResult<IndexerStatus>;

    /// Status is VALID.
    fn is_valid(&self) -> IndexerResult<bool> {
        Ok(self.status()? == IndexerStatus::Valid)
    }

    /// Status is INVALID.
    fn is_invalid(&self) -> IndexerResult<bool> {
        Ok(self.status()? == IndexerStatus::Invalid)
    }

    /// Status is WORKING.
    fn is_working(&self) -> IndexerResult<bool> {
        Ok(self.status()? == IndexerStatus::Working)
    }

    /// Status is SUSPENDED.
    fn is_suspended(&self) -> IndexerResult<bool> {
        Ok(self.status()? == IndexerStatus::Suspended)
    }

    /// Whether the view is subscribed to its changelog.
    fn is_scheduled(&self) -> IndexerResult<bool>;

    /// Most recent update time of the indexer or its view.
    fn latest_updated(&self) -> IndexerResult<Option<DateTime<Utc>>>;

    /// Full rebuild.
    fn reindex_all(&self) -> IndexerResult<ReindexOutcome>;

    /// Rebuild one entity row.
    fn reindex_row(&self, id: EntityId) -> IndexerResult<()>;

    /// Rebuild a list of entity rows.
    fn reindex_list(&self, ids: &[EntityId]) -> IndexerResult<()>;

    /// Mark INVALID and persist.
    fn invalidate(&self) -> IndexerResult<()>;

    /// Subscribe to or unsubscribe from the changelog.
    fn set_scheduled(&self, scheduled: bool) -> IndexerResult<()>;

    /// Operator status override.
    fn set_status(&self, status: IndexerStatus) -> IndexerResult<()>;

    /// Apply pending changelog rows. Returns the number of ids applied.
    fn update_from_changelog(&self) -> IndexerResult<usize>;
}

//! # Domain Errors
//!
//! Error types for the indexer coordinator.

use crate::domain::status::IndexerStatus;
use std::path::PathBuf;
use thiserror::Error;

/// Indexer identifier as declared in the static configuration.
pub type IndexerId = String;

/// Changelog view identifier.
pub type ViewId = String;

/// Primary key of a changed entity row.
pub type EntityId = u64;

/// Result alias used across the coordinator.
pub type IndexerResult<T> = Result<T, IndexerError>;

/// Coordinator error types.
#[derive(Debug, Error)]
pub enum IndexerError {
    /// The indexer id is not present in the static configuration.
    #[error("Unknown indexer: {0}")]
    UnknownIndexer(IndexerId),

    /// A referenced indexer id is absent while walking the dependency graph.
    #[error("No such entity: indexer {0} is not configured")]
    NoSuchEntity(IndexerId),

    /// The dependency graph contains a cycle.
    #[error("Cyclic dependency: {}", path.join(" -> "))]
    CyclicDependency {
        /// Ids along the cycle, first and last element equal
        path: Vec<IndexerId>,
    },

    /// Status change rejected by the transition rules.
    #[error("Invalid status transition for {indexer_id}: {from} -> {to}")]
    InvalidTransition {
        /// Indexer id
        indexer_id: IndexerId,
        /// Current status
        from: IndexerStatus,
        /// Attempted status
        to: IndexerStatus,
    },

    /// Action failure, surfaced verbatim.
    #[error(transparent)]
    Action(#[from] ActionError),

    /// State store failure.
    #[error("State store error: {0}")]
    Store(#[from] StoreError),

    /// Changelog view failure.
    #[error("View error: {0}")]
    View(#[from] ViewError),

    /// Static configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Opaque failure reported by an indexer action.
#[derive(Debug, Error)]
#[error("Indexer action failed for {indexer_id}: {message}")]
pub struct ActionError {
    /// Indexer id
    pub indexer_id: IndexerId,
    /// Failure description
    pub message: String,
    /// Underlying cause, when the action has one
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ActionError {
    /// Action failure without an underlying cause.
    pub fn new(indexer_id: impl Into<IndexerId>, message: impl Into<String>) -> Self {
        Self {
            indexer_id: indexer_id.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

/// Changelog view errors.
#[derive(Debug, Error)]
pub enum ViewError {
    /// The changelog table does not exist yet.
    #[error("Changelog for view {view_id} does not exist")]
    ChangelogMissing {
        /// View id
        view_id: ViewId,
    },

    /// Persisting the view state failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// File I/O failed.
    #[error("I/O error at {path}: {error}")]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        error: std::io::Error,
    },

    /// Document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Exclusive lock could not be taken.
    #[error("Lock error: {0}")]
    Lock(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_lists_path() {
        let err = IndexerError::CyclicDependency {
            path: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "Cyclic dependency: a -> b -> a");
    }

    #[test]
    fn test_action_error_is_transparent() {
        let err: IndexerError = ActionError::new("catalog_product_price", "boom").into();
        assert_eq!(
            err.to_string(),
            "Indexer action failed for catalog_product_price: boom"
        );
    }

    #[test]
    fn test_action_error_keeps_source() {
        use std::error::Error as _;
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err = ActionError::new("x", "write failed").with_source(io);
        assert_eq!(err.source().unwrap().to_string(), "disk full");
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = IndexerError::InvalidTransition {
            indexer_id: "x".into(),
            from: IndexerStatus::Suspended,
            to: IndexerStatus::Working,
        };
        assert_eq!(
            err.to_string(),
            "Invalid status transition for x: suspended -> working"
        );
    }
}

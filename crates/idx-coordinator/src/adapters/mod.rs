//! # Adapters
//!
//! Implementations of the outbound ports.

pub mod command_action;
pub mod document_store;
pub mod mock_action;
pub mod working_state;

pub use command_action::{CommandAction, CommandActionFactory};
pub use document_store::{
    Changelog, ChangelogEntry, DocumentBackend, DocumentStore, DocumentView, JsonFileBackend,
    MemoryBackend, StateDocument,
};
pub use mock_action::{ActionCalls, MockAction, MockActionFactory};
pub use working_state::StoreWorkingStateProvider;

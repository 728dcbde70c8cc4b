//! # Domain Module
//!
//! Core domain types for the indexer coordinator.

pub mod config;
pub mod entities;
pub mod errors;
pub mod status;

pub use config::*;
pub use entities::*;
pub use errors::*;
pub use status::*;

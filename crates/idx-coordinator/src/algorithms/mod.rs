//! # Algorithms Module
//!
//! Dependency graph resolution and changelog freshness checks.

pub mod dependency_graph;
pub mod freshness;

pub use dependency_graph::DependencyInfoProvider;
pub use freshness::{backlog, is_view_up_to_date};

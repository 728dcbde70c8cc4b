//! # Static Indexer Configuration
//!
//! Indexer definitions loaded once per process from a TOML file.
//!
//! # Config File Format
//!
//! ```toml
//! [[indexer]]
//! id = "catalog_product_price"
//! title = "Product Price"
//! action_class = "bin/reindex-price"
//! shared_index = "catalog_product"
//! dependencies = ["catalog_product_attribute"]
//! ```
//!
//! Unknown dependency ids and cycles are accepted here; they are reported
//! when the dependency graph is walked.

use crate::domain::entities::IndexerDefinition;
use crate::domain::errors::{IndexerError, IndexerResult};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default, rename = "indexer")]
    indexers: Vec<IndexerDefinition>,
}

/// Validated set of indexer definitions in declaration order.
#[derive(Clone, Debug, Default)]
pub struct IndexerConfigSet {
    definitions: Vec<IndexerDefinition>,
}

impl IndexerConfigSet {
    /// Load definitions from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the file cannot be read, parsed or validated.
    pub fn load<P: AsRef<Path>>(path: P) -> IndexerResult<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            IndexerError::Config(format!("{}: {}", path.as_ref().display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parse definitions from a TOML string.
    pub fn parse(content: &str) -> IndexerResult<Self> {
        let file: ConfigFile =
            toml::from_str(content).map_err(|e| IndexerError::Config(e.to_string()))?;
        Self::from_definitions(file.indexers)
    }

    /// Build from already constructed definitions.
    pub fn from_definitions(definitions: Vec<IndexerDefinition>) -> IndexerResult<Self> {
        let mut seen = HashSet::new();
        for def in &definitions {
            if def.id.trim().is_empty() {
                return Err(IndexerError::Config("indexer id must not be empty".into()));
            }
            if !seen.insert(def.id.as_str()) {
                return Err(IndexerError::Config(format!(
                    "duplicate indexer id: {}",
                    def.id
                )));
            }
            if def.action_class.trim().is_empty() {
                return Err(IndexerError::Config(format!(
                    "indexer {} has no action_class",
                    def.id
                )));
            }
        }
        Ok(Self { definitions })
    }

    /// Definition by id.
    pub fn get(&self, id: &str) -> Option<&IndexerDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    /// Definition by id, failing for unconfigured ids.
    pub fn require(&self, id: &str) -> IndexerResult<&IndexerDefinition> {
        self.get(id)
            .ok_or_else(|| IndexerError::UnknownIndexer(id.to_string()))
    }

    /// Whether the id is configured.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// All ids in declaration order.
    pub fn ids(&self) -> Vec<String> {
        self.definitions.iter().map(|d| d.id.clone()).collect()
    }

    /// All definitions in declaration order.
    pub fn definitions(&self) -> &[IndexerDefinition] {
        &self.definitions
    }

    /// Number of configured indexers.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether nothing is configured.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Other members of `id`'s shared index group.
    ///
    /// Recomputed by a full scan on every call.
    pub fn shared_index_peers(&self, id: &str) -> IndexerResult<Vec<String>> {
        let def = self.require(id)?;
        let Some(group) = def.shared_index.as_deref() else {
            return Ok(Vec::new());
        };
        Ok(self
            .definitions
            .iter()
            .filter(|d| d.id != id && d.shared_index.as_deref() == Some(group))
            .map(|d| d.id.clone())
            .collect())
    }
}

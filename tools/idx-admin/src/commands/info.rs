//! `info`: list configured indexers.

use idx_coordinator::{IndexerApi, IndexerRegistry};
use std::io::Write;

/// Print `id  title` for every indexer.
pub fn run(registry: &IndexerRegistry, out: &mut dyn Write) -> anyhow::Result<()> {
    let width = registry
        .all()
        .iter()
        .map(|i| i.id().len())
        .max()
        .unwrap_or(0);
    for indexer in registry.all() {
        writeln!(out, "{:<width$}  {}", indexer.id(), indexer.title())?;
    }
    Ok(())
}

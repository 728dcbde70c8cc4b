//! `reset`: invalidate indexers.

use super::report_batch;
use idx_coordinator::IndexerRegistry;
use std::io::Write;

/// Mark `ids` (all when empty) INVALID.
pub fn run(registry: &IndexerRegistry, ids: &[String], out: &mut dyn Write) -> anyhow::Result<()> {
    let results = registry.invalidate(ids)?;
    report_batch(registry, results, out, |title, _| {
        format!("{title} indexer has been invalidated.")
    })
}

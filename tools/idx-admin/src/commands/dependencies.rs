//! `dependencies`: run-before / run-after closure of one indexer.

use idx_coordinator::{IndexerApi, IndexerRegistry};
use std::io::Write;

fn section(
    registry: &IndexerRegistry,
    heading: &str,
    ids: &[String],
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    writeln!(out, "{heading}:")?;
    if ids.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for id in ids {
        let indexer = registry.get(id)?;
        writeln!(out, "  {id} ({})", indexer.title())?;
    }
    Ok(())
}

/// Print what must run before and after `id`.
pub fn run(registry: &IndexerRegistry, id: &str, out: &mut dyn Write) -> anyhow::Result<()> {
    let graph = registry.dependencies();
    let before = graph.indexer_ids_to_run_before(id)?;
    let after = graph.indexer_ids_to_run_after(id)?;

    section(registry, &format!("Run before {id}"), &before, out)?;
    section(registry, &format!("Run after {id}"), &after, out)
}

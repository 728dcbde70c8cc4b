//! `update`: apply changelogs of scheduled indexers.

use super::report_batch;
use idx_coordinator::IndexerRegistry;
use idx_telemetry::log_batch_event;
use std::io::Write;

/// One changelog pass over every scheduled indexer.
pub fn run(registry: &IndexerRegistry, out: &mut dyn Write) -> anyhow::Result<()> {
    let results = registry.update_scheduled();
    log_batch_event!(debug, "update", "Changelog pass finished", indexers = results.len());
    if results.is_empty() {
        writeln!(out, "No indexers are updated by schedule.")?;
        return Ok(());
    }
    report_batch(registry, results, out, |title, rows| {
        format!("{title}: {rows} entity id(s) applied from changelog")
    })
}

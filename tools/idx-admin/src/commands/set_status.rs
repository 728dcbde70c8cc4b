//! `set-status`: operator override.

use super::status_label;
use anyhow::bail;
use idx_coordinator::{IndexerApi, IndexerRegistry, IndexerResult, IndexerStatus};
use std::io::Write;

/// Move `ids` (all when empty) to `status`, subject to the transition rules.
pub fn run(
    registry: &IndexerRegistry,
    status: IndexerStatus,
    ids: &[String],
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let mut failed = 0;

    for indexer in registry.resolve(ids)? {
        let result = indexer.status().and_then(|before| -> IndexerResult<_> {
            if before != status {
                indexer.set_status(status)?;
            }
            Ok(before)
        });
        match result {
            Ok(before) if before == status => writeln!(
                out,
                "Index status for Indexer '{}' is already '{}'",
                indexer.title(),
                status_label(status)
            )?,
            Ok(before) => writeln!(
                out,
                "Index status for Indexer '{}' was changed from '{}' to '{}'",
                indexer.title(),
                status_label(before),
                status_label(status)
            )?,
            Err(e) => {
                failed += 1;
                writeln!(out, "{} indexer failed: {e}", indexer.title())?;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} indexer(s) failed to change status");
    }
    Ok(())
}

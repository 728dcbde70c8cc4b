//! `set-mode` and `show-mode`.

use crate::cli::ModeArg;
use anyhow::bail;
use idx_coordinator::{IndexerApi, IndexerMode, IndexerRegistry, IndexerResult};
use std::io::Write;

/// Switch `ids` (all when empty) to `mode`. Indexers already in `mode` are left alone.
pub fn set(
    registry: &IndexerRegistry,
    mode: ModeArg,
    ids: &[String],
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let target = IndexerMode::from_scheduled(mode.is_scheduled());
    let mut failed = 0;

    for indexer in registry.resolve(ids)? {
        let result = indexer.is_scheduled().and_then(|scheduled| -> IndexerResult<_> {
            let before = IndexerMode::from_scheduled(scheduled);
            if before != target {
                indexer.set_scheduled(target.is_scheduled())?;
            }
            Ok(before)
        });
        match result {
            Ok(before) if before == target => writeln!(
                out,
                "Index mode for Indexer {} has not been changed",
                indexer.title()
            )?,
            Ok(before) => writeln!(
                out,
                "Index mode for Indexer {} was changed from '{}' to '{}'",
                indexer.title(),
                before,
                target
            )?,
            Err(e) => {
                failed += 1;
                writeln!(out, "{} indexer failed: {e}", indexer.title())?;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} indexer(s) failed to change mode");
    }
    Ok(())
}

/// Print the mode of `ids` (all when empty).
pub fn show(registry: &IndexerRegistry, ids: &[String], out: &mut dyn Write) -> anyhow::Result<()> {
    let indexers = registry.resolve(ids)?;
    let width = indexers.iter().map(|i| i.title().len() + 1).max().unwrap_or(0);
    for indexer in indexers {
        let mode = IndexerMode::from_scheduled(indexer.is_scheduled()?);
        writeln!(
            out,
            "{:<width$}  {}",
            format!("{}:", indexer.title()),
            mode
        )?;
    }
    Ok(())
}

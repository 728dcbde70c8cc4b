//! Subcommand implementations.
//!
//! Every command writes its report to `out` and returns an error when any
//! requested indexer failed, so the binary exits non-zero.

pub mod changelog;
pub mod dependencies;
pub mod info;
pub mod mode;
pub mod reindex;
pub mod reset;
pub mod set_status;
pub mod status;
pub mod update;

use crate::cli::Commands;
use crate::context::AdminContext;
use anyhow::bail;
use idx_coordinator::{BatchResults, IndexerApi, IndexerRegistry, IndexerStatus};
use std::io::Write;

/// Run `command` against `ctx`.
pub fn dispatch(
    command: &Commands,
    ctx: &AdminContext,
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let registry = ctx.registry();
    match command {
        Commands::Info => info::run(registry, out),
        Commands::Status { ids } => status::run(registry, ids, json, out),
        Commands::Reindex { ids } => reindex::run(registry, ids, json, out),
        Commands::Reset { ids } => reset::run(registry, ids, out),
        Commands::SetMode { mode, ids } => mode::set(registry, *mode, ids, out),
        Commands::ShowMode { ids } => mode::show(registry, ids, out),
        Commands::SetStatus { status, ids } => set_status::run(registry, (*status).into(), ids, out),
        Commands::Dependencies { id } => dependencies::run(registry, id, out),
        Commands::Update => update::run(registry, out),
        Commands::Changelog { view_id, ids } => changelog::run(ctx, view_id, ids, out),
    }
}

/// Operator-facing status label.
pub fn status_label(status: IndexerStatus) -> &'static str {
    match status {
        IndexerStatus::Valid => "Ready",
        IndexerStatus::Invalid => "Reindex required",
        IndexerStatus::Working => "Processing",
        IndexerStatus::Suspended => "Suspended",
    }
}

fn title_of(registry: &IndexerRegistry, id: &str) -> String {
    registry
        .get(id)
        .map(|i| i.title().to_string())
        .unwrap_or_else(|_| id.to_string())
}

/// Print one line per result; fail if any indexer failed.
pub(crate) fn report_batch<T, F>(
    registry: &IndexerRegistry,
    results: BatchResults<T>,
    out: &mut dyn Write,
    success: F,
) -> anyhow::Result<()>
where
    F: Fn(&str, &T) -> String,
{
    let total = results.len();
    let mut failed = 0;
    for (id, result) in results {
        let title = title_of(registry, &id);
        match result {
            Ok(value) => writeln!(out, "{}", success(&title, &value))?,
            Err(e) => {
                failed += 1;
                writeln!(out, "{title} indexer failed: {e}")?;
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {total} indexer(s) failed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_labels() {
        assert_eq!(status_label(IndexerStatus::Valid), "Ready");
        assert_eq!(status_label(IndexerStatus::Invalid), "Reindex required");
        assert_eq!(status_label(IndexerStatus::Working), "Processing");
    }
}

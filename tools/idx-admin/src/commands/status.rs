//! `status`: one row per indexer.

use super::status_label;
use crate::metrics::PrometheusMetrics;
use idx_coordinator::{IndexerRegistry, IndexerStatusRow};
use std::io::Write;

fn schedule_column(row: &IndexerStatusRow) -> String {
    match row.view_status {
        Some(status) => format!("{status} ({} in backlog)", row.backlog),
        None => String::new(),
    }
}

/// Print the status table (or JSON) for `ids`.
pub fn run(
    registry: &IndexerRegistry,
    ids: &[String],
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let rows = registry.status_report(ids)?;
    for row in &rows {
        let indexer = registry.get(&row.id)?;
        PrometheusMetrics::observe_backlog(indexer.definition().view_id(), row.backlog);
    }

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&rows)?)?;
        return Ok(());
    }

    let title_width = rows
        .iter()
        .map(|r| r.title.len())
        .chain(std::iter::once("Title".len()))
        .max()
        .unwrap_or(0);

    writeln!(
        out,
        "{:<title_width$}  {:<16}  {:<19}  {:<24}  Updated",
        "Title", "Status", "Update On", "Schedule Status"
    )?;
    for row in &rows {
        let updated = row
            .updated
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "never".to_string());
        writeln!(
            out,
            "{:<title_width$}  {:<16}  {:<19}  {:<24}  {}",
            row.title,
            status_label(row.status),
            row.mode.to_string(),
            schedule_column(row),
            updated
        )?;
    }
    Ok(())
}

//! `reindex`: batch full rebuild.

use anyhow::bail;
use idx_coordinator::{BatchStepOutcome, IndexerRegistry};
use idx_telemetry::{log_batch_event, log_indexer_event};
use std::io::Write;
use std::time::Duration;

fn hms(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

/// Rebuild `ids` (all when empty) in dependency order.
pub fn run(
    registry: &IndexerRegistry,
    ids: &[String],
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let report = registry.reindex(ids)?;
    for step in &report.steps {
        log_indexer_event!(
            debug,
            step.indexer_id,
            "Batch step finished",
            outcome = ?step.outcome,
            duration_ms = step.duration.as_millis() as u64
        );
    }

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        for step in &report.steps {
            match &step.outcome {
                BatchStepOutcome::Rebuilt => writeln!(
                    out,
                    "{} index has been rebuilt successfully in {}",
                    step.title,
                    hms(step.duration)
                )?,
                BatchStepOutcome::ValidatedBySharedIndex => writeln!(
                    out,
                    "{} index is valid: its shared index was rebuilt in this run",
                    step.title
                )?,
                BatchStepOutcome::SkippedWorking => writeln!(
                    out,
                    "{} index is being rebuilt by another process, skipped",
                    step.title
                )?,
                BatchStepOutcome::SkippedSuspended => {
                    writeln!(out, "{} index is suspended, skipped", step.title)?
                }
                BatchStepOutcome::Failed(message) => writeln!(
                    out,
                    "{} index process error during indexation process:\n{}",
                    step.title, message
                )?,
            }
        }
    }

    let failed = report
        .steps
        .iter()
        .filter(|s| matches!(s.outcome, BatchStepOutcome::Failed(_)))
        .count();
    log_batch_event!(info, "reindex", "Reindex command finished", steps = report.steps.len(), failed = failed);
    if failed > 0 {
        bail!("{failed} indexer(s) failed to rebuild");
    }
    Ok(())
}

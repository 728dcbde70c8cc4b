//! `changelog`: record entity changes.

use crate::context::AdminContext;
use anyhow::bail;
use idx_coordinator::EntityId;
use std::io::Write;

/// Append `ids` to `view_id`'s changelog as one new version.
pub fn run(
    ctx: &AdminContext,
    view_id: &str,
    ids: &[EntityId],
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let known = ctx
        .registry()
        .all()
        .iter()
        .any(|i| i.definition().view_id() == view_id);
    if !known {
        bail!("no indexer uses view '{view_id}'");
    }

    let version = ctx.store().record_change(view_id, ids)?;
    writeln!(
        out,
        "Recorded {} id(s) in changelog '{view_id}' at version {version}",
        ids.len()
    )?;
    Ok(())
}

//! Single-step table maintenance workflows.

use crate::error::Result;
use crate::executor::Session;
use crate::gateway::Notice;
use crate::run_context::RunContext;

/// Delete a table. Protection and confirmation gates live in the executor step.
pub fn delete_table(session: &mut Session<'_>, ctx: &mut RunContext, table: &str) -> Result<()> {
    session.delete_table(ctx, table)?;
    session.notify(Notice::Success, &format!("{} deleted", table));
    Ok(())
}

pub fn enable_pitr(session: &mut Session<'_>, ctx: &mut RunContext, table: &str) -> Result<()> {
    session.enable_pitr(ctx, table)
}

pub fn enable_deletion_protection(
    session: &mut Session<'_>,
    ctx: &mut RunContext,
    table: &str,
) -> Result<()> {
    session.enable_deletion_protection(ctx, table)
}

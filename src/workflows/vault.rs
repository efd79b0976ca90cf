//! Vault snapshot restore: replace a table with a recovery point.

use tracing::info;

use super::pick_recovery_point;
use crate::cleanup::offer_cleanup;
use crate::error::Result;
use crate::executor::Session;
use crate::gateway::Notice;
use crate::naming;
use crate::operation::OpKind;
use crate::run_context::RunContext;

pub fn vault_restore(session: &mut Session<'_>, ctx: &mut RunContext, table: &str) -> Result<()> {
    let point = pick_recovery_point(session, Some(table))?;
    info!(table, recovery_point = %point.arn, "vault restore");

    let safety_backup = naming::original_backup_name(table, session.now());
    session.backup_table(ctx, OpKind::BackupOriginal, table, &safety_backup)?;
    session.delete_table(ctx, table)?;
    session.restore_from_vault(ctx, table, &point)?;

    session.notify(
        Notice::Success,
        &format!("{} restored from vault recovery point", table),
    );
    offer_cleanup(session, ctx)?;
    Ok(())
}

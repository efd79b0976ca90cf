//! Point-in-time restore.
//!
//! The table is rolled back by way of a duplicate: the duplicate is created
//! at the chosen time, backed up, and that backup is restored under the
//! original name once the original (itself backed up first) is deleted.

use tracing::info;

use crate::cleanup::offer_cleanup;
use crate::error::{RescueError, Result};
use crate::executor::Session;
use crate::gateway::{Notice, Prompt};
use crate::naming;
use crate::operation::OpKind;
use crate::run_context::RunContext;

pub fn pitr_restore(session: &mut Session<'_>, ctx: &mut RunContext, table: &str) -> Result<()> {
    let pitr = session.store.describe_continuous_backups(table)?;
    let (earliest, latest) = pitr.window().ok_or_else(|| {
        RescueError::validation(format!(
            "point-in-time recovery is not enabled on {}",
            table
        ))
    })?;

    let restore_at = session.gateway.date_time(
        &Prompt::new("Restore to which point in time (UTC)?").with_help(
            "Enter a time inside the restorable window, for example 2024-03-15T09:30:00.",
        ),
        earliest,
        latest,
    )?;

    let stamped = session.now();
    let duplicate = naming::duplicate_name(table, stamped);
    let original_backup = naming::original_backup_name(table, stamped);
    info!(table, %restore_at, duplicate = %duplicate, "point-in-time restore");

    session.duplicate_table(ctx, table, &duplicate, restore_at)?;
    session.backup_table(ctx, OpKind::BackupOriginal, table, &original_backup)?;
    session.backup_table(ctx, OpKind::BackupDuplicate, &duplicate, &duplicate)?;
    session.delete_table(ctx, table)?;

    let duplicate_backup = ctx
        .get(OpKind::BackupDuplicate)
        .and_then(|record| record.created_backup())
        .cloned()
        .ok_or_else(|| RescueError::state("duplicate backup step left no backup"))?;
    session.restore_from_backup(ctx, table, &duplicate_backup)?;
    session.enable_pitr(ctx, table)?;
    session.enable_deletion_protection(ctx, table)?;

    session.notify(
        Notice::Success,
        &format!(
            "{} restored to {}",
            table,
            restore_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
    );
    offer_cleanup(session, ctx)?;
    Ok(())
}

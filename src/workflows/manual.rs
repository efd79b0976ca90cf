//! Manual backup and the two restore-into-a-new-table workflows.

use tracing::info;

use super::pick_recovery_point;
use crate::error::{RescueError, Result};
use crate::executor::Session;
use crate::gateway::{Notice, Prompt};
use crate::naming;
use crate::operation::OpKind;
use crate::run_context::RunContext;
use crate::services::BackupDescriptor;

/// Reject `name` unless it is a valid, unused table name.
pub fn ensure_absent(session: &Session<'_>, name: &str) -> Result<()> {
    naming::validate_name(name).map_err(RescueError::validation)?;
    if session.store.list_tables()?.iter().any(|t| t == name) {
        return Err(RescueError::validation(format!(
            "table {} already exists; restores need a new table name",
            name
        )));
    }
    Ok(())
}

pub fn manual_backup(session: &mut Session<'_>, ctx: &mut RunContext, table: &str) -> Result<()> {
    let name = naming::manual_backup_name(table, session.now());
    session.backup_table(ctx, OpKind::BackupOriginal, table, &name)?;
    session.notify(Notice::Success, &format!("Backup {} is available", name));
    Ok(())
}

pub fn manual_restore_native(
    session: &mut Session<'_>,
    ctx: &mut RunContext,
    new_table: &str,
) -> Result<()> {
    ensure_absent(session, new_table)?;

    let backups: Vec<BackupDescriptor> = session
        .store
        .list_backups(None)?
        .into_iter()
        .filter(BackupDescriptor::is_available)
        .collect();
    let mut sources: Vec<String> = backups.iter().map(|b| b.table.clone()).collect();
    sources.sort();
    sources.dedup();
    if sources.is_empty() {
        return Err(RescueError::validation("no available on-demand backups"));
    }

    let source = session.gateway.choose(
        &Prompt::new("Restore from the backups of which table?"),
        &sources,
    )?;
    let source = &sources[source];

    let mut candidates: Vec<&BackupDescriptor> =
        backups.iter().filter(|b| &b.table == source).collect();
    candidates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let labels: Vec<String> = candidates
        .iter()
        .map(|b| {
            format!(
                "{}  {}",
                b.name,
                b.created_at
                    .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                    .unwrap_or_default()
            )
        })
        .collect();
    let picked = session
        .gateway
        .choose(&Prompt::new("Choose a backup (newest first)"), &labels)?;
    let backup = candidates[picked].clone();

    info!(source = %source, backup = %backup.name, new_table, "manual restore from backup");
    session.restore_from_backup(ctx, new_table, &backup)?;
    session.notify(
        Notice::Success,
        &format!("{} restored into {}", backup.name, new_table),
    );
    Ok(())
}

pub fn manual_restore_vault(
    session: &mut Session<'_>,
    ctx: &mut RunContext,
    new_table: &str,
) -> Result<()> {
    ensure_absent(session, new_table)?;

    let vault = session.settings.vault_name.clone();
    let mut sources: Vec<String> = session
        .vault
        .list_recovery_points(&vault, None)?
        .into_iter()
        .filter(|point| point.status.is_restorable())
        .map(|point| point.resource_name)
        .collect();
    sources.sort();
    sources.dedup();
    if sources.is_empty() {
        return Err(RescueError::validation(format!(
            "no restorable recovery points in vault {}",
            vault
        )));
    }

    let source = session.gateway.choose(
        &Prompt::new("Restore from the recovery points of which table?"),
        &sources,
    )?;
    let point = pick_recovery_point(session, Some(&sources[source]))?;

    info!(source = %point.resource_name, recovery_point = %point.arn, new_table, "manual restore from vault");
    session.restore_from_vault(ctx, new_table, &point)?;
    session.notify(
        Notice::Success,
        &format!("{} restored into {}", point.resource_name, new_table),
    );
    Ok(())
}

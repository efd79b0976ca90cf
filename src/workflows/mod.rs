//! Workflow orchestrators.
//!
//! Each workflow is a fixed sequence of executor steps. A failed step returns
//! its error straight away, so nothing after it runs; the process selector
//! decides what to do next.
//!
//! | Choice | Steps |
//! |--------|-------|
//! | PITR restore | duplicate → backup original → backup duplicate → delete original → restore → enable PITR → enable protection |
//! | Vault restore | backup original → delete original → restore from recovery point |
//! | Manual backup | backup original |
//! | Manual restore (native / vault) | restore into a new table |
//! | Delete table | delete original |
//! | Enable PITR / protection | single enable step |

mod manual;
mod pitr;
mod table_ops;
mod vault;

pub use manual::{ensure_absent, manual_backup, manual_restore_native, manual_restore_vault};
pub use pitr::pitr_restore;
pub use table_ops::{delete_table, enable_deletion_protection, enable_pitr};
pub use vault::vault_restore;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::{RescueError, Result};
use crate::executor::Session;
use crate::gateway::Prompt;
use crate::run_context::RunContext;
use crate::services::RecoveryPoint;
use crate::types::StorageTier;

/// The eight recovery processes an operator can start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum RestoreChoice {
    PitrRestore,
    VaultRestore,
    ManualBackup,
    ManualRestoreNative,
    ManualRestoreVault,
    DeleteTable,
    EnablePitr,
    EnableDeletionProtection,
}

impl RestoreChoice {
    pub fn title(&self) -> &'static str {
        match self {
            Self::PitrRestore => "Point-in-time restore",
            Self::VaultRestore => "Restore from vault snapshot",
            Self::ManualBackup => "Manual backup",
            Self::ManualRestoreNative => "Restore on-demand backup into a new table",
            Self::ManualRestoreVault => "Restore vault snapshot into a new table",
            Self::DeleteTable => "Delete table",
            Self::EnablePitr => "Enable point-in-time recovery",
            Self::EnableDeletionProtection => "Enable deletion protection",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::PitrRestore => {
                "Roll a table back to a moment inside its point-in-time recovery window"
            }
            Self::VaultRestore => "Replace a table with a recovery point from the backup vault",
            Self::ManualBackup => "Take an on-demand backup of a table",
            Self::ManualRestoreNative => "Copy an on-demand backup into a brand-new table",
            Self::ManualRestoreVault => "Copy a vault recovery point into a brand-new table",
            Self::DeleteTable => "Permanently delete a table",
            Self::EnablePitr => "Turn on continuous backups for a table",
            Self::EnableDeletionProtection => "Stop a table from being deleted by accident",
        }
    }

    /// Rough wall-clock time, shown in the menu.
    pub fn estimated_duration(&self) -> &'static str {
        match self {
            Self::PitrRestore => "30-90 min",
            Self::VaultRestore => "1-4 h (longer from cold storage)",
            Self::ManualBackup => "1-5 min",
            Self::ManualRestoreNative => "15-60 min",
            Self::ManualRestoreVault => "1-4 h",
            Self::DeleteTable => "1-5 min",
            Self::EnablePitr | Self::EnableDeletionProtection => "< 1 min",
        }
    }

    /// Manual restores write into a table that must not exist yet.
    pub fn needs_new_table(&self) -> bool {
        matches!(self, Self::ManualRestoreNative | Self::ManualRestoreVault)
    }

    pub fn menu_label(&self) -> String {
        format!(
            "{:<42} {} ({})",
            self.title(),
            self.description(),
            self.estimated_duration()
        )
    }
}

/// Run `choice` against `table` inside `ctx`.
pub fn run(
    session: &mut Session<'_>,
    ctx: &mut RunContext,
    choice: RestoreChoice,
    table: &str,
) -> Result<()> {
    match choice {
        RestoreChoice::PitrRestore => pitr_restore(session, ctx, table),
        RestoreChoice::VaultRestore => vault_restore(session, ctx, table),
        RestoreChoice::ManualBackup => manual_backup(session, ctx, table),
        RestoreChoice::ManualRestoreNative => manual_restore_native(session, ctx, table),
        RestoreChoice::ManualRestoreVault => manual_restore_vault(session, ctx, table),
        RestoreChoice::DeleteTable => delete_table(session, ctx, table),
        RestoreChoice::EnablePitr => enable_pitr(session, ctx, table),
        RestoreChoice::EnableDeletionProtection => enable_deletion_protection(session, ctx, table),
    }
}

// ============================================================================
// Shared pickers
// ============================================================================

/// Let the operator pick a restorable recovery point, newest first.
///
/// Cold-storage picks need an extra confirmation; declining shows the list again.
pub(crate) fn pick_recovery_point(
    session: &mut Session<'_>,
    resource_name: Option<&str>,
) -> Result<RecoveryPoint> {
    let vault = session.settings.vault_name.clone();
    let mut points: Vec<RecoveryPoint> = session
        .vault
        .list_recovery_points(&vault, resource_name)?
        .into_iter()
        .filter(|point| point.status.is_restorable())
        .collect();
    if points.is_empty() {
        return Err(RescueError::validation(format!(
            "no restorable recovery points{} in vault {}",
            resource_name
                .map(|r| format!(" for {}", r))
                .unwrap_or_default(),
            vault
        )));
    }
    points.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));

    let now = session.now();
    let labels: Vec<String> = points
        .iter()
        .map(|point| {
            format!(
                "{}  {}  [{}]",
                point.resource_name,
                point
                    .completed_at
                    .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                    .unwrap_or_else(|| "unknown time".to_string()),
                point.tier(now)
            )
        })
        .collect();

    loop {
        let index = session.gateway.choose(
            &Prompt::new("Choose a recovery point").with_help(
                "Recovery points are listed newest first. Cold points restore much more slowly.",
            ),
            &labels,
        )?;
        if points[index].tier(now) == StorageTier::Cold {
            let prompt = Prompt::new(
                "This recovery point is in cold storage and restoring it is much slower. Use it anyway?",
            )
            .with_help("Answer no to pick a different recovery point.");
            if !session.gateway.confirm(&prompt)? {
                continue;
            }
        }
        return Ok(points.swap_remove(index));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_eight_choices() {
        assert_eq!(RestoreChoice::iter().count(), 8);
    }

    #[test]
    fn test_only_manual_restores_need_new_table() {
        let needing: Vec<RestoreChoice> = RestoreChoice::iter()
            .filter(RestoreChoice::needs_new_table)
            .collect();
        assert_eq!(
            needing,
            vec![
                RestoreChoice::ManualRestoreNative,
                RestoreChoice::ManualRestoreVault
            ]
        );
    }

    #[test]
    fn test_choice_ids() {
        assert_eq!(RestoreChoice::PitrRestore.to_string(), "pitr-restore");
        assert_eq!(
            "enable-deletion-protection".parse::<RestoreChoice>().unwrap(),
            RestoreChoice::EnableDeletionProtection
        );
    }
}

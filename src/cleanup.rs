//! Compensator: best-effort removal of transient resources.
//!
//! After a run (successful or not) the point-in-time duplicate and the
//! backups taken along the way can be removed. Each resource is handled on its
//! own; one failure is reported and never stops the others. Every delete is
//! preceded by an existence check, so running cleanup twice is harmless.
//!
//! The safety backup of the original table is only removed while the original
//! table is still listed. Without the table, that backup may be the only copy
//! of the data left. A completed manual backup is never removed.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::executor::Session;
use crate::gateway::{Notice, Prompt};
use crate::operation::{OpKind, OperationRecord};
use crate::run_context::RunContext;
use crate::services::BackupDescriptor;
use crate::types::{BackupStatus, TableStatus};
use crate::workflows::RestoreChoice;

/// What happened to one resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum CleanupOutcome {
    Deleted,
    AlreadyGone,
    Skipped(String),
    Failed(String),
}

impl fmt::Display for CleanupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deleted => write!(f, "deleted"),
            Self::AlreadyGone => write!(f, "already gone"),
            Self::Skipped(reason) => write!(f, "skipped ({})", reason),
            Self::Failed(message) => write!(f, "FAILED: {}", message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupItem {
    pub step: OpKind,
    pub resource: String,
    pub outcome: CleanupOutcome,
}

/// Per-resource outcomes of one cleanup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    pub items: Vec<CleanupItem>,
}

impl CleanupReport {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn failures(&self) -> impl Iterator<Item = &CleanupItem> {
        self.items
            .iter()
            .filter(|item| matches!(item.outcome, CleanupOutcome::Failed(_)))
    }

    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn outcome_of(&self, step: OpKind) -> Option<&CleanupOutcome> {
        self.items
            .iter()
            .find(|item| item.step == step)
            .map(|item| &item.outcome)
    }

    fn push(&mut self, step: OpKind, resource: &str, outcome: CleanupOutcome) {
        self.items.push(CleanupItem {
            step,
            resource: resource.to_string(),
            outcome,
        });
    }
}

/// True if the run created anything cleanup would look at.
pub fn has_transient_resources(ctx: &RunContext) -> bool {
    [OpKind::Duplicate, OpKind::BackupOriginal, OpKind::BackupDuplicate]
        .iter()
        .filter_map(|kind| ctx.get(*kind))
        .any(|record| record.response.is_some())
}

/// Remove the run's transient resources. Never fails as a whole.
pub fn cleanup(session: &mut Session<'_>, ctx: &RunContext) -> CleanupReport {
    let mut report = CleanupReport::default();

    if let Some(record) = ctx.get(OpKind::Duplicate).filter(|r| r.response.is_some()) {
        if let Some(name) = record.target_table.as_deref() {
            let outcome = settle(remove_table(session, name));
            report.push(OpKind::Duplicate, name, outcome);
        }
    }

    if let Some((record, backup)) = with_backup(ctx, OpKind::BackupOriginal) {
        let original = record.source_table.as_deref().unwrap_or(&backup.table);
        let requested = record.is_success() && is_manual_backup_run(ctx);
        let outcome = if requested {
            CleanupOutcome::Skipped("requested by the operator".to_string())
        } else {
            match session.store.list_tables() {
                Ok(tables) if tables.iter().any(|t| t == original) => {
                    settle(remove_backup(session, backup))
                }
                Ok(_) => {
                    warn!(
                        table = original,
                        backup = %backup.name,
                        "original table is gone; keeping its safety backup"
                    );
                    CleanupOutcome::Skipped(format!(
                        "{} is not listed, so this backup may be the only copy of its data",
                        original
                    ))
                }
                Err(err) => CleanupOutcome::Failed(err.to_string()),
            }
        };
        report.push(OpKind::BackupOriginal, &backup.name, outcome);
    }

    if let Some((_, backup)) = with_backup(ctx, OpKind::BackupDuplicate) {
        let outcome = settle(remove_backup(session, backup));
        report.push(OpKind::BackupDuplicate, &backup.name, outcome);
    }

    for item in &report.items {
        info!(step = %item.step, resource = %item.resource, outcome = %item.outcome, "cleanup");
    }
    report
}

/// Ask, then clean up. `Ok(None)` when the operator said no.
pub fn offer_cleanup(session: &mut Session<'_>, ctx: &RunContext) -> Result<Option<CleanupReport>> {
    let prompt = Prompt::new("Remove the temporary tables and backups created by this run?")
        .with_help(
            "Cleanup deletes the point-in-time duplicate and the backups taken during this run. \
             A safety backup is kept whenever its original table no longer exists.",
        );
    if !session.gateway.confirm(&prompt)? {
        session.notify(Notice::Info, "Leaving temporary resources in place.");
        return Ok(None);
    }
    let report = cleanup(session, ctx);
    announce(session, &report);
    Ok(Some(report))
}

/// Print a report through the gateway.
pub fn announce(session: &mut Session<'_>, report: &CleanupReport) {
    if report.is_empty() {
        session.notify(Notice::Info, "Nothing to clean up.");
        return;
    }
    for item in &report.items {
        let notice = match item.outcome {
            CleanupOutcome::Deleted | CleanupOutcome::AlreadyGone => Notice::Success,
            CleanupOutcome::Skipped(_) => Notice::Warning,
            CleanupOutcome::Failed(_) => Notice::Error,
        };
        session.notify(notice, &format!("{}: {}", item.resource, item.outcome));
    }
}

fn is_manual_backup_run(ctx: &RunContext) -> bool {
    ctx.workflow()
        .and_then(|workflow| workflow.parse::<RestoreChoice>().ok())
        == Some(RestoreChoice::ManualBackup)
}

fn with_backup(ctx: &RunContext, kind: OpKind) -> Option<(&OperationRecord, &BackupDescriptor)> {
    let record = ctx.get(kind)?;
    record.created_backup().map(|backup| (record, backup))
}

fn settle(result: Result<CleanupOutcome>) -> CleanupOutcome {
    result.unwrap_or_else(|err| CleanupOutcome::Failed(err.to_string()))
}

fn remove_table(session: &mut Session<'_>, name: &str) -> Result<CleanupOutcome> {
    if !session.store.list_tables()?.iter().any(|t| t == name) {
        return Ok(CleanupOutcome::AlreadyGone);
    }
    // A duplicate whose step timed out may still be CREATING
    if session.store.table_status(name)? != Some(TableStatus::Active) {
        session.table_exists(name, true)?;
    }
    session.store.delete_table(name)?;
    session.table_exists(name, false)?;
    Ok(CleanupOutcome::Deleted)
}

fn remove_backup(session: &mut Session<'_>, backup: &BackupDescriptor) -> Result<CleanupOutcome> {
    let current = session
        .store
        .list_backups(Some(&backup.table))?
        .into_iter()
        .find(|b| b.arn == backup.arn && b.status != BackupStatus::Deleted);
    let Some(current) = current else {
        return Ok(CleanupOutcome::AlreadyGone);
    };
    if !current.is_available() {
        session.backup_exists(&backup.table, &backup.name)?;
    }
    session.store.delete_backup(&backup.arn)?;
    Ok(CleanupOutcome::Deleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_display() {
        assert_eq!(CleanupOutcome::Deleted.to_string(), "deleted");
        assert_eq!(CleanupOutcome::AlreadyGone.to_string(), "already gone");
        assert!(
            CleanupOutcome::Skipped("kept".into())
                .to_string()
                .contains("kept")
        );
    }

    #[test]
    fn test_report_failures() {
        let mut report = CleanupReport::default();
        report.push(OpKind::Duplicate, "parks--dupe-1", CleanupOutcome::Deleted);
        assert!(report.is_clean());

        report.push(
            OpKind::BackupDuplicate,
            "parks--dupe-1",
            CleanupOutcome::Failed("throttled".into()),
        );
        assert!(!report.is_clean());
        assert_eq!(report.failures().count(), 1);
        assert_eq!(
            report.outcome_of(OpKind::Duplicate),
            Some(&CleanupOutcome::Deleted)
        );
    }

    #[test]
    fn test_empty_context_has_nothing_transient() {
        let ctx = RunContext::new(chrono::Utc::now());
        assert!(!has_transient_resources(&ctx));
    }
}

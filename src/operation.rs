//! Operation records and the operation registry.
//!
//! Every step of a recovery workflow is tracked by an [`OperationRecord`]:
//! which external call it makes, how its post-condition is verified, what the
//! call returned and whether the step succeeded. The registry is a pure
//! factory: [`OpKind::new_record`] hands out an independent record each time,
//! so nothing leaks from one run into the next.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::RescueError;
use crate::services::{BackupDescriptor, PitrState, RecoveryPoint, RestoreJob, TableDescriptor};

// ============================================================================
// Kinds
// ============================================================================

/// The fixed set of steps a run can contain. Also the key set of a `RunContext`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OpKind {
    /// Point-in-time copy of the original table
    Duplicate,
    /// Safety backup of the original table
    BackupOriginal,
    /// Backup of the point-in-time duplicate
    BackupDuplicate,
    /// Deletion of the original table
    DeleteOriginal,
    /// Restore from an on-demand backup
    RestoreNative,
    /// Restore from a vault recovery point
    RestoreVault,
    EnablePitr,
    EnableDeletionProtection,
}

/// Which external call a record makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum Action {
    RestoreToPointInTime,
    CreateBackup,
    DeleteTable,
    RestoreFromBackup,
    StartVaultRestore,
    EnablePitr,
    EnableDeletionProtection,
}

/// Named predicates that are neither table nor backup existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum CustomCheck {
    PitrEnabled,
    DeletionProtectionEnabled,
}

/// Verification predicate, as a tagged union so records stay inspectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckKind {
    TableExists,
    BackupExists,
    Custom(CustomCheck),
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TableExists => write!(f, "table exists"),
            Self::BackupExists => write!(f, "backup exists"),
            Self::Custom(custom) => write!(f, "{}", custom),
        }
    }
}

/// Arguments for a check, filled in by the executor once the action has run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckArgs {
    Table { table: String, should_exist: bool },
    Backup { table: String, backup: String },
    Target { table: String },
}

impl CheckArgs {
    /// Whether these arguments fit the given predicate.
    pub fn fits(&self, check: CheckKind) -> bool {
        matches!(
            (check, self),
            (CheckKind::TableExists, Self::Table { .. })
                | (CheckKind::BackupExists, Self::Backup { .. })
                | (CheckKind::Custom(_), Self::Target { .. })
        )
    }
}

/// What a check returned. Only `Bool` can ever equal the expected value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CheckValue {
    Bool(bool),
    Text(String),
}

impl fmt::Display for CheckValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{}", value),
            Self::Text(text) => write!(f, "\"{}\"", text),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OpStatus {
    #[default]
    Pending,
    Success,
    Failed,
}

/// Raw result of an external action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ActionResponse {
    Table(TableDescriptor),
    Backup(BackupDescriptor),
    ContinuousBackups(PitrState),
    RestoreJob(RestoreJob),
}

/// The backup a restore step reads from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SelectedBackup {
    Native(BackupDescriptor),
    Vault(RecoveryPoint),
}

// ============================================================================
// Registry
// ============================================================================

/// Fixed, per-kind part of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpTemplate {
    pub operation_name: &'static str,
    pub action: Action,
    pub check: CheckKind,
    pub expect_from_check: bool,
}

impl OpKind {
    pub const fn template(self) -> OpTemplate {
        match self {
            Self::Duplicate => OpTemplate {
                operation_name: "Duplicate table to point in time",
                action: Action::RestoreToPointInTime,
                check: CheckKind::TableExists,
                expect_from_check: true,
            },
            Self::BackupOriginal => OpTemplate {
                operation_name: "Back up original table",
                action: Action::CreateBackup,
                check: CheckKind::BackupExists,
                expect_from_check: true,
            },
            Self::BackupDuplicate => OpTemplate {
                operation_name: "Back up duplicate table",
                action: Action::CreateBackup,
                check: CheckKind::BackupExists,
                expect_from_check: true,
            },
            Self::DeleteOriginal => OpTemplate {
                operation_name: "Delete original table",
                action: Action::DeleteTable,
                check: CheckKind::TableExists,
                expect_from_check: false,
            },
            Self::RestoreNative => OpTemplate {
                operation_name: "Restore table from on-demand backup",
                action: Action::RestoreFromBackup,
                check: CheckKind::TableExists,
                expect_from_check: true,
            },
            Self::RestoreVault => OpTemplate {
                operation_name: "Restore table from vault recovery point",
                action: Action::StartVaultRestore,
                check: CheckKind::TableExists,
                expect_from_check: true,
            },
            Self::EnablePitr => OpTemplate {
                operation_name: "Enable point-in-time recovery",
                action: Action::EnablePitr,
                check: CheckKind::Custom(CustomCheck::PitrEnabled),
                expect_from_check: true,
            },
            Self::EnableDeletionProtection => OpTemplate {
                operation_name: "Enable deletion protection",
                action: Action::EnableDeletionProtection,
                check: CheckKind::Custom(CustomCheck::DeletionProtectionEnabled),
                expect_from_check: true,
            },
        }
    }

    /// A brand-new record for this kind, with every mutable field empty.
    pub fn new_record(self) -> OperationRecord {
        let template = self.template();
        OperationRecord {
            kind: self,
            operation_name: template.operation_name.to_string(),
            action: template.action,
            check: template.check,
            expect_from_check: template.expect_from_check,
            args: None,
            response: None,
            error_message: None,
            status: OpStatus::Pending,
            source_table: None,
            target_table: None,
            backup_name: None,
            restore_point_in_time: None,
            backup: None,
        }
    }
}

// ============================================================================
// Record
// ============================================================================

/// Bookkeeping for one step of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub kind: OpKind,
    pub operation_name: String,
    pub action: Action,
    pub check: CheckKind,
    pub expect_from_check: bool,
    pub args: Option<CheckArgs>,
    pub response: Option<ActionResponse>,
    pub error_message: Option<String>,
    pub status: OpStatus,
    pub source_table: Option<String>,
    pub target_table: Option<String>,
    pub backup_name: Option<String>,
    /// Operator-chosen restore time (PITR duplicates only)
    pub restore_point_in_time: Option<DateTime<Utc>>,
    pub backup: Option<SelectedBackup>,
}

impl OperationRecord {
    pub fn is_success(&self) -> bool {
        self.status == OpStatus::Success
    }

    pub fn is_failed(&self) -> bool {
        self.status == OpStatus::Failed
    }

    pub fn mark_success(&mut self) {
        self.status = OpStatus::Success;
        self.error_message = None;
    }

    pub fn mark_failed(&mut self, err: &RescueError) {
        self.status = OpStatus::Failed;
        self.error_message = Some(err.to_string());
    }

    /// The backup created by this step, if the action returned one.
    pub fn created_backup(&self) -> Option<&BackupDescriptor> {
        match &self.response {
            Some(ActionResponse::Backup(backup)) => Some(backup),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_new_record_is_pending_and_empty() {
        for kind in OpKind::iter() {
            let record = kind.new_record();
            assert_eq!(record.status, OpStatus::Pending);
            assert!(record.args.is_none());
            assert!(record.response.is_none());
            assert!(record.error_message.is_none());
            assert!(record.source_table.is_none());
            assert!(record.target_table.is_none());
            assert!(record.backup.is_none());
        }
    }

    #[test]
    fn test_records_are_independent() {
        let mut first = OpKind::BackupOriginal.new_record();
        first.source_table = Some("parks".to_string());
        first.mark_failed(&RescueError::validation("boom"));

        let second = OpKind::BackupOriginal.new_record();
        assert!(second.source_table.is_none());
        assert_eq!(second.status, OpStatus::Pending);
    }

    #[test]
    fn test_delete_expects_absence() {
        let template = OpKind::DeleteOriginal.template();
        assert_eq!(template.check, CheckKind::TableExists);
        assert!(!template.expect_from_check);
    }

    #[test]
    fn test_check_args_fit_their_kind() {
        let table = CheckArgs::Table {
            table: "parks".into(),
            should_exist: true,
        };
        assert!(table.fits(CheckKind::TableExists));
        assert!(!table.fits(CheckKind::BackupExists));

        let target = CheckArgs::Target { table: "parks".into() };
        assert!(target.fits(CheckKind::Custom(CustomCheck::PitrEnabled)));
        assert!(!target.fits(CheckKind::TableExists));
    }

    #[test]
    fn test_op_kind_keys() {
        assert_eq!(OpKind::BackupOriginal.to_string(), "backup_original");
        assert_eq!("delete_original".parse::<OpKind>().unwrap(), OpKind::DeleteOriginal);
    }

    #[test]
    fn test_check_value_display_distinguishes_text() {
        assert_eq!(CheckValue::Bool(true).to_string(), "true");
        assert_eq!(CheckValue::Text("ACTIVE".into()).to_string(), "\"ACTIVE\"");
    }
}

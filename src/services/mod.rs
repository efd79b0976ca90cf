//! External service contracts.
//!
//! The recovery engine talks to two services it does not own:
//!
//! - a **table store** hosting named tables with on-demand backups,
//!   point-in-time recovery (PITR) and deletion protection
//! - a **backup vault** holding longer-retention recovery points
//!
//! Both are reached through the traits below so that workflows run unchanged
//! against the in-memory simulator (`memory`) or the AWS adapter (`aws`).
//! Every method is a single blocking call; the engine never has more than one
//! in flight.

pub mod memory;

#[cfg(feature = "aws")]
pub mod aws;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{BackupStatus, RecoveryPointStatus, StorageTier, TableStatus};

// ============================================================================
// Descriptors
// ============================================================================

/// Continuous-backup (PITR) state of a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PitrState {
    pub enabled: bool,
    /// Earliest restorable time; `None` while PITR is disabled.
    #[serde(default)]
    pub earliest: Option<DateTime<Utc>>,
    /// Latest restorable time; `None` while PITR is disabled.
    #[serde(default)]
    pub latest: Option<DateTime<Utc>>,
}

impl PitrState {
    /// The restorable window, if PITR is enabled and the service reported one.
    pub fn window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match (self.enabled, self.earliest, self.latest) {
            (true, Some(earliest), Some(latest)) if earliest <= latest => Some((earliest, latest)),
            _ => None,
        }
    }
}

/// A table as reported by the table store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub name: String,
    pub status: TableStatus,
    pub deletion_protection: bool,
    #[serde(default)]
    pub pitr: PitrState,
}

/// An on-demand backup held by the table store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupDescriptor {
    pub arn: String,
    pub name: String,
    pub table: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub status: BackupStatus,
}

impl BackupDescriptor {
    pub fn is_available(&self) -> bool {
        self.status == BackupStatus::Available
    }
}

/// A recovery point held by the backup vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryPoint {
    pub arn: String,
    /// Name of the table the point was taken from.
    pub resource_name: String,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub status: RecoveryPointStatus,
    #[serde(default)]
    pub move_to_cold_at: Option<DateTime<Utc>>,
}

impl RecoveryPoint {
    pub fn tier(&self, now: DateTime<Utc>) -> StorageTier {
        StorageTier::at(self.move_to_cold_at, now)
    }
}

/// A restore job started in the backup vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreJob {
    pub job_id: String,
    pub target_table: String,
}

// ============================================================================
// Service traits
// ============================================================================

/// The table-store API consumed by the engine.
pub trait TableStore {
    /// Names of every table, in any status.
    fn list_tables(&self) -> Result<Vec<String>>;

    /// Full description, or `None` when the table does not exist.
    fn describe_table(&self, name: &str) -> Result<Option<TableDescriptor>>;

    /// Status only. Adapters override this when describing is expensive.
    fn table_status(&self, name: &str) -> Result<Option<TableStatus>> {
        Ok(self.describe_table(name)?.map(|table| table.status))
    }

    fn describe_continuous_backups(&self, name: &str) -> Result<PitrState>;

    fn create_backup(&self, table: &str, backup_name: &str) -> Result<BackupDescriptor>;

    /// On-demand backups, optionally restricted to one source table.
    fn list_backups(&self, table: Option<&str>) -> Result<Vec<BackupDescriptor>>;

    fn delete_backup(&self, backup_arn: &str) -> Result<()>;

    fn delete_table(&self, name: &str) -> Result<TableDescriptor>;

    fn restore_table_from_backup(
        &self,
        target_table: &str,
        backup_arn: &str,
    ) -> Result<TableDescriptor>;

    fn restore_table_to_point_in_time(
        &self,
        source_table: &str,
        target_table: &str,
        restore_at: DateTime<Utc>,
    ) -> Result<TableDescriptor>;

    fn set_deletion_protection(&self, name: &str, enabled: bool) -> Result<TableDescriptor>;

    fn enable_pitr(&self, name: &str) -> Result<PitrState>;
}

/// The backup-vault API consumed by the engine.
pub trait BackupVault {
    /// Recovery points in `vault`, optionally only those taken from `resource_name`.
    fn list_recovery_points(
        &self,
        vault: &str,
        resource_name: Option<&str>,
    ) -> Result<Vec<RecoveryPoint>>;

    fn start_restore_job(
        &self,
        recovery_point_arn: &str,
        target_table: &str,
        iam_role_arn: &str,
    ) -> Result<RestoreJob>;
}

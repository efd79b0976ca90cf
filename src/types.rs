//! Type-safe status types for tablerescue
//!
//! Remote services report statuses as strings. These enums give them exhaustive
//! matching; the string forms are the wire spellings both services use.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Lifecycle status of a table in the table store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TableStatus {
    #[default]
    Creating,
    Updating,
    Active,
    Deleting,
    #[strum(to_string = "ARCHIVED", serialize = "ARCHIVING")]
    Archived,
    #[strum(to_string = "INACCESSIBLE_ENCRYPTION_CREDENTIALS", serialize = "INACCESSIBLE")]
    Inaccessible,
}

/// Status of an on-demand (native) backup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum BackupStatus {
    #[default]
    Creating,
    Available,
    Deleted,
}

/// Status of a recovery point held in the backup vault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RecoveryPointStatus {
    #[default]
    #[strum(to_string = "COMPLETED", serialize = "AVAILABLE")]
    Completed,
    Partial,
    Creating,
    Deleting,
    Expired,
    Stopped,
}

impl RecoveryPointStatus {
    /// Only completed recovery points can be restored from
    pub fn is_restorable(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Vault storage tier, derived from the move-to-cold-storage timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum StorageTier {
    #[default]
    Warm,
    Cold,
}

impl StorageTier {
    /// A recovery point is cold once its move-to-cold time has passed.
    pub fn at(move_to_cold_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        match move_to_cold_at {
            Some(when) if when <= now => Self::Cold,
            _ => Self::Warm,
        }
    }
}

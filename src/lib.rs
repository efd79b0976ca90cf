//! tablerescue library
//!
//! Disaster-recovery orchestration for the parks reporting tables: verified,
//! step-by-step backup, duplicate, delete and restore workflows against a
//! table store and a backup vault.

pub mod cleanup;
pub mod cli;
pub mod config_file;
pub mod error;
pub mod executor;
pub mod gateway;
pub mod journal;
pub mod naming;
pub mod operation;
pub mod poller;
pub mod preflight;
pub mod run_context;
pub mod selector;
pub mod services;
pub mod types;
pub mod verify;
pub mod workflows;

// Re-export main types for convenience
pub use cleanup::{CleanupOutcome, CleanupReport, cleanup, offer_cleanup};
pub use config_file::RescueConfig;
pub use error::{RescueError, Result};
pub use executor::{RecoverySettings, Session};
pub use gateway::{ConsoleGateway, Gateway, Notice, Prompt};
pub use journal::Journal;
pub use operation::{CheckArgs, CheckKind, CheckValue, OpKind, OpStatus, OperationRecord};
pub use poller::{Clock, Interrupt, ManualClock, Poller, SystemClock, Timeout};
pub use run_context::{RunContext, RunTransitionError};
pub use selector::{SessionEnd, run_menu};
pub use services::memory::{CloudFixture, InMemoryCloud};
pub use services::{
    BackupDescriptor, BackupVault, PitrState, RecoveryPoint, RestoreJob, TableDescriptor,
    TableStore,
};
pub use types::{BackupStatus, RecoveryPointStatus, StorageTier, TableStatus};
pub use verify::{Verifier, check_and_update};
pub use workflows::RestoreChoice;

#[cfg(feature = "aws")]
pub use services::aws::AwsCloud;

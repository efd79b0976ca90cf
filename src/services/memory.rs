//! In-memory table store and backup vault.
//!
//! `InMemoryCloud` behaves like the real services closely enough to rehearse
//! a recovery end to end:
//!
//! - **Eventual consistency**: new tables and backups start `CREATING`,
//!   deleted tables linger as `DELETING`; each settles after
//!   `settle_after` read calls (0 = immediately)
//! - **Deletion protection**: protected tables refuse deletion
//! - **Failure injection**: `fail_next("CreateBackup", ..)` makes the next
//!   call of that action fail; `fail_next_on` narrows it to one target
//! - **Shared clock**: `with_clock` stamps backups and PITR windows with the
//!   rehearsal's virtual time instead of the wall clock
//! - **Call log**: every mutating call is recorded for assertions
//!
//! Clones share state, so a test can keep a handle while the engine owns another.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    BackupDescriptor, BackupVault, PitrState, RecoveryPoint, RestoreJob, TableDescriptor,
    TableStore,
};
use crate::error::{RescueError, Result};
use crate::poller::{Clock, ManualClock};
use crate::types::{BackupStatus, TableStatus};

/// Seed data for a simulated cloud, loadable from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CloudFixture {
    #[serde(default)]
    pub tables: Vec<TableDescriptor>,
    #[serde(default)]
    pub backups: Vec<BackupDescriptor>,
    /// Recovery points per vault name
    #[serde(default)]
    pub vaults: BTreeMap<String, Vec<RecoveryPoint>>,
    /// Read calls before a creation or deletion becomes visible
    #[serde(default)]
    pub settle_after: u32,
}

/// One recorded mutating call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudCall {
    pub action: &'static str,
    pub target: String,
}

#[derive(Debug)]
struct SimTable {
    desc: TableDescriptor,
    countdown: u32,
}

#[derive(Debug)]
struct SimBackup {
    desc: BackupDescriptor,
    countdown: u32,
}

/// A queued failure, optionally limited to one target
#[derive(Debug)]
struct InjectedFailure {
    target: Option<String>,
    message: String,
}

#[derive(Debug, Default)]
struct CloudState {
    tables: BTreeMap<String, SimTable>,
    /// Keyed by ARN
    backups: BTreeMap<String, SimBackup>,
    vaults: BTreeMap<String, Vec<RecoveryPoint>>,
    settle_after: u32,
    failures: HashMap<String, VecDeque<InjectedFailure>>,
    calls: Vec<CloudCall>,
    next_id: u64,
    clock: Option<ManualClock>,
}

impl CloudState {
    /// Record a call and fire any injected failure for it.
    fn enter(&mut self, action: &'static str, target: &str, mutating: bool) -> Result<()> {
        if mutating {
            self.calls.push(CloudCall {
                action,
                target: target.to_string(),
            });
        }
        let Some(queue) = self.failures.get_mut(action) else {
            return Ok(());
        };
        let matching = queue
            .iter()
            .position(|f| f.target.as_deref().is_none_or(|t| t == target));
        if let Some(failure) = matching.and_then(|i| queue.remove(i)) {
            debug!(action, target, "injected failure");
            return Err(RescueError::external(action, failure.message));
        }
        Ok(())
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.as_ref().map_or_else(Utc::now, |clock| clock.now())
    }

    /// One observation: advance every pending transition.
    fn settle(&mut self) {
        let mut gone = Vec::new();
        for (name, table) in self.tables.iter_mut() {
            if table.countdown == 0 {
                continue;
            }
            table.countdown -= 1;
            if table.countdown == 0 {
                match table.desc.status {
                    TableStatus::Creating | TableStatus::Updating => {
                        table.desc.status = TableStatus::Active
                    }
                    TableStatus::Deleting => gone.push(name.clone()),
                    _ => {}
                }
            }
        }
        for name in gone {
            self.tables.remove(&name);
        }

        let mut deleted = Vec::new();
        for (arn, backup) in self.backups.iter_mut() {
            if backup.countdown == 0 {
                continue;
            }
            backup.countdown -= 1;
            if backup.countdown == 0 {
                match backup.desc.status {
                    BackupStatus::Creating => backup.desc.status = BackupStatus::Available,
                    BackupStatus::Deleted => deleted.push(arn.clone()),
                    BackupStatus::Available => {}
                }
            }
        }
        for arn in deleted {
            self.backups.remove(&arn);
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// ARN for a new backup of `table`, skipping any already taken by seeded backups.
    fn next_backup_arn(&mut self, table: &str) -> String {
        loop {
            let id = self.next_id();
            let arn = format!(
                "arn:sim:dynamodb:local:000000000000:table/{}/backup/{:017}",
                table, id
            );
            if !self.backups.contains_key(&arn) {
                return arn;
            }
        }
    }

    fn ensure_absent(&self, action: &'static str, name: &str) -> Result<()> {
        if self.tables.contains_key(name) {
            return Err(RescueError::external(
                action,
                format!("TableAlreadyExistsException: table {} already exists", name),
            ));
        }
        Ok(())
    }

    fn active_table(&self, action: &'static str, name: &str) -> Result<&SimTable> {
        let table = self.tables.get(name).ok_or_else(|| {
            RescueError::external(
                action,
                format!("TableNotFoundException: table {} not found", name),
            )
        })?;
        if table.desc.status != TableStatus::Active {
            return Err(RescueError::external(
                action,
                format!(
                    "ResourceInUseException: table {} is {}",
                    name, table.desc.status
                ),
            ));
        }
        Ok(table)
    }

    /// Insert a table that becomes ACTIVE after settling.
    fn create_table(&mut self, name: &str) -> TableDescriptor {
        let settle_after = self.settle_after;
        let desc = TableDescriptor {
            name: name.to_string(),
            status: if settle_after == 0 {
                TableStatus::Active
            } else {
                TableStatus::Creating
            },
            deletion_protection: false,
            pitr: PitrState::default(),
        };
        self.tables.insert(
            name.to_string(),
            SimTable {
                desc: desc.clone(),
                countdown: settle_after,
            },
        );
        desc
    }
}

/// Simulated table store and backup vault sharing one state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCloud {
    state: Arc<Mutex<CloudState>>,
}

impl InMemoryCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: CloudFixture) -> Self {
        let cloud = Self::new().with_settle_after(fixture.settle_after);
        for table in fixture.tables {
            cloud.put_table(table);
        }
        for backup in fixture.backups {
            cloud.put_backup(backup);
        }
        for (vault, points) in fixture.vaults {
            cloud.put_vault(&vault);
            for point in points {
                cloud.put_recovery_point(&vault, point);
            }
        }
        cloud
    }

    /// Load a JSON [`CloudFixture`] from disk.
    pub fn load_fixture(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let fixture: CloudFixture = serde_json::from_str(&content)?;
        Ok(Self::from_fixture(fixture))
    }

    pub fn with_settle_after(self, reads: u32) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.settle_after = reads;
        }
        self
    }

    /// Stamp new resources with `clock` time.
    pub fn with_clock(self, clock: ManualClock) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.clock = Some(clock);
        }
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, CloudState>> {
        self.state
            .lock()
            .map_err(|_| RescueError::state("simulated cloud state is poisoned"))
    }

    // ------------------------------------------------------------------------
    // Seeding and inspection (bypass settling and the call log)
    // ------------------------------------------------------------------------

    pub fn put_table(&self, desc: TableDescriptor) {
        if let Ok(mut state) = self.state.lock() {
            state
                .tables
                .insert(desc.name.clone(), SimTable { desc, countdown: 0 });
        }
    }

    pub fn put_backup(&self, desc: BackupDescriptor) {
        if let Ok(mut state) = self.state.lock() {
            state
                .backups
                .insert(desc.arn.clone(), SimBackup { desc, countdown: 0 });
        }
    }

    /// Create an empty vault.
    pub fn put_vault(&self, vault: &str) {
        if let Ok(mut state) = self.state.lock() {
            state.vaults.entry(vault.to_string()).or_default();
        }
    }

    pub fn put_recovery_point(&self, vault: &str, point: RecoveryPoint) {
        if let Ok(mut state) = self.state.lock() {
            state.vaults.entry(vault.to_string()).or_default().push(point);
        }
    }

    pub fn table(&self, name: &str) -> Option<TableDescriptor> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.tables.get(name).map(|t| t.desc.clone()))
    }

    pub fn backups(&self) -> Vec<BackupDescriptor> {
        self.state
            .lock()
            .map(|state| state.backups.values().map(|b| b.desc.clone()).collect())
            .unwrap_or_default()
    }

    /// Make the next `action` call fail with `message`.
    pub fn fail_next(&self, action: &str, message: &str) {
        self.queue_failure(action, None, message);
    }

    /// Make the next `action` call against `target` fail with `message`.
    pub fn fail_next_on(&self, action: &str, target: &str, message: &str) {
        self.queue_failure(action, Some(target), message);
    }

    fn queue_failure(&self, action: &str, target: Option<&str>, message: &str) {
        if let Ok(mut state) = self.state.lock() {
            state
                .failures
                .entry(action.to_string())
                .or_default()
                .push_back(InjectedFailure {
                    target: target.map(str::to_string),
                    message: message.to_string(),
                });
        }
    }

    /// Mutating calls, in order.
    pub fn calls(&self) -> Vec<CloudCall> {
        self.state
            .lock()
            .map(|state| state.calls.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self, action: &str) -> usize {
        self.calls().iter().filter(|c| c.action == action).count()
    }
}

impl TableStore for InMemoryCloud {
    fn list_tables(&self) -> Result<Vec<String>> {
        let mut state = self.lock()?;
        state.enter("ListTables", "", false)?;
        state.settle();
        Ok(state.tables.keys().cloned().collect())
    }

    fn describe_table(&self, name: &str) -> Result<Option<TableDescriptor>> {
        let mut state = self.lock()?;
        state.enter("DescribeTable", name, false)?;
        state.settle();
        Ok(state.tables.get(name).map(|t| t.desc.clone()))
    }

    fn describe_continuous_backups(&self, name: &str) -> Result<PitrState> {
        let mut state = self.lock()?;
        state.enter("DescribeContinuousBackups", name, false)?;
        state.settle();
        state
            .tables
            .get(name)
            .map(|t| t.desc.pitr.clone())
            .ok_or_else(|| {
                RescueError::external(
                    "DescribeContinuousBackups",
                    format!("TableNotFoundException: table {} not found", name),
                )
            })
    }

    fn create_backup(&self, table: &str, backup_name: &str) -> Result<BackupDescriptor> {
        let mut state = self.lock()?;
        state.enter("CreateBackup", table, true)?;
        state.active_table("CreateBackup", table)?;

        let arn = state.next_backup_arn(table);
        let settle_after = state.settle_after;
        let desc = BackupDescriptor {
            arn,
            name: backup_name.to_string(),
            table: table.to_string(),
            created_at: Some(state.now()),
            status: if settle_after == 0 {
                BackupStatus::Available
            } else {
                BackupStatus::Creating
            },
        };
        state.backups.insert(
            desc.arn.clone(),
            SimBackup {
                desc: desc.clone(),
                countdown: settle_after,
            },
        );
        Ok(desc)
    }

    fn list_backups(&self, table: Option<&str>) -> Result<Vec<BackupDescriptor>> {
        let mut state = self.lock()?;
        state.enter("ListBackups", table.unwrap_or(""), false)?;
        state.settle();
        Ok(state
            .backups
            .values()
            .map(|b| &b.desc)
            .filter(|b| table.is_none_or(|t| b.table == t))
            .cloned()
            .collect())
    }

    fn delete_backup(&self, backup_arn: &str) -> Result<()> {
        let mut state = self.lock()?;
        state.enter("DeleteBackup", backup_arn, true)?;
        let settle_after = state.settle_after;
        let Some(backup) = state.backups.get_mut(backup_arn) else {
            return Err(RescueError::external(
                "DeleteBackup",
                format!("BackupNotFoundException: {} not found", backup_arn),
            ));
        };
        if backup.desc.status == BackupStatus::Creating {
            return Err(RescueError::external(
                "DeleteBackup",
                format!("BackupInUseException: {} is still being created", backup_arn),
            ));
        }
        if settle_after == 0 {
            state.backups.remove(backup_arn);
        } else {
            backup.desc.status = BackupStatus::Deleted;
            backup.countdown = settle_after;
        }
        Ok(())
    }

    fn delete_table(&self, name: &str) -> Result<TableDescriptor> {
        let mut state = self.lock()?;
        state.enter("DeleteTable", name, true)?;
        let protected = state.active_table("DeleteTable", name)?.desc.deletion_protection;
        if protected {
            return Err(RescueError::external(
                "DeleteTable",
                format!(
                    "ValidationException: table {} has deletion protection enabled",
                    name
                ),
            ));
        }

        let settle_after = state.settle_after;
        if settle_after == 0 {
            let mut removed = state
                .tables
                .remove(name)
                .map(|t| t.desc)
                .ok_or_else(|| RescueError::state(format!("table {} vanished", name)))?;
            removed.status = TableStatus::Deleting;
            return Ok(removed);
        }
        let table = state
            .tables
            .get_mut(name)
            .ok_or_else(|| RescueError::state(format!("table {} vanished", name)))?;
        table.desc.status = TableStatus::Deleting;
        table.countdown = settle_after;
        Ok(table.desc.clone())
    }

    fn restore_table_from_backup(
        &self,
        target_table: &str,
        backup_arn: &str,
    ) -> Result<TableDescriptor> {
        let mut state = self.lock()?;
        state.enter("RestoreTableFromBackup", target_table, true)?;
        match state.backups.get(backup_arn) {
            Some(backup) if backup.desc.is_available() => {}
            Some(backup) => {
                return Err(RescueError::external(
                    "RestoreTableFromBackup",
                    format!(
                        "BackupInUseException: backup {} is {}",
                        backup_arn, backup.desc.status
                    ),
                ));
            }
            None => {
                return Err(RescueError::external(
                    "RestoreTableFromBackup",
                    format!("BackupNotFoundException: {} not found", backup_arn),
                ));
            }
        }
        state.ensure_absent("RestoreTableFromBackup", target_table)?;
        Ok(state.create_table(target_table))
    }

    fn restore_table_to_point_in_time(
        &self,
        source_table: &str,
        target_table: &str,
        restore_at: DateTime<Utc>,
    ) -> Result<TableDescriptor> {
        let mut state = self.lock()?;
        state.enter("RestoreTableToPointInTime", target_table, true)?;
        let window = state
            .active_table("RestoreTableToPointInTime", source_table)?
            .desc
            .pitr
            .window();
        match window {
            Some((earliest, latest)) if restore_at >= earliest && restore_at <= latest => {}
            Some(_) => {
                return Err(RescueError::external(
                    "RestoreTableToPointInTime",
                    format!(
                        "InvalidRestoreTimeException: {} is outside the restorable window",
                        restore_at
                    ),
                ));
            }
            None => {
                return Err(RescueError::external(
                    "RestoreTableToPointInTime",
                    format!(
                        "PointInTimeRecoveryUnavailableException: PITR is not enabled on {}",
                        source_table
                    ),
                ));
            }
        }
        state.ensure_absent("RestoreTableToPointInTime", target_table)?;
        Ok(state.create_table(target_table))
    }

    fn set_deletion_protection(&self, name: &str, enabled: bool) -> Result<TableDescriptor> {
        let mut state = self.lock()?;
        state.enter("UpdateTable", name, true)?;
        state.active_table("UpdateTable", name)?;
        let table = state
            .tables
            .get_mut(name)
            .ok_or_else(|| RescueError::state(format!("table {} vanished", name)))?;
        table.desc.deletion_protection = enabled;
        Ok(table.desc.clone())
    }

    fn enable_pitr(&self, name: &str) -> Result<PitrState> {
        let mut state = self.lock()?;
        state.enter("UpdateContinuousBackups", name, true)?;
        state.active_table("UpdateContinuousBackups", name)?;
        let now = state.now();
        let table = state
            .tables
            .get_mut(name)
            .ok_or_else(|| RescueError::state(format!("table {} vanished", name)))?;
        if !table.desc.pitr.enabled {
            table.desc.pitr = PitrState {
                enabled: true,
                earliest: Some(now),
                latest: Some(now),
            };
        }
        Ok(table.desc.pitr.clone())
    }
}

impl BackupVault for InMemoryCloud {
    fn list_recovery_points(
        &self,
        vault: &str,
        resource_name: Option<&str>,
    ) -> Result<Vec<RecoveryPoint>> {
        let mut state = self.lock()?;
        state.enter("ListRecoveryPointsByBackupVault", vault, false)?;
        state.settle();
        let points = state.vaults.get(vault).ok_or_else(|| {
            RescueError::external(
                "ListRecoveryPointsByBackupVault",
                format!("ResourceNotFoundException: backup vault {} does not exist", vault),
            )
        })?;
        Ok(points
            .iter()
            .filter(|p| resource_name.is_none_or(|r| p.resource_name == r))
            .cloned()
            .collect())
    }

    fn start_restore_job(
        &self,
        recovery_point_arn: &str,
        target_table: &str,
        iam_role_arn: &str,
    ) -> Result<RestoreJob> {
        let mut state = self.lock()?;
        state.enter("StartRestoreJob", target_table, true)?;
        if iam_role_arn.is_empty() {
            return Err(RescueError::external(
                "StartRestoreJob",
                "InvalidParameterValueException: IamRoleArn is required",
            ));
        }
        let point = state
            .vaults
            .values()
            .flatten()
            .find(|p| p.arn == recovery_point_arn)
            .cloned()
            .ok_or_else(|| {
                RescueError::external(
                    "StartRestoreJob",
                    format!("ResourceNotFoundException: {} not found", recovery_point_arn),
                )
            })?;
        if !point.status.is_restorable() {
            return Err(RescueError::external(
                "StartRestoreJob",
                format!(
                    "InvalidRequestException: recovery point is {}",
                    point.status
                ),
            ));
        }
        state.ensure_absent("StartRestoreJob", target_table)?;
        state.create_table(target_table);
        let id = state.next_id();
        Ok(RestoreJob {
            job_id: format!("job-{:08}", id),
            target_table: target_table.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecoveryPointStatus;
    use chrono::TimeZone;

    fn active(name: &str) -> TableDescriptor {
        TableDescriptor {
            name: name.to_string(),
            status: TableStatus::Active,
            deletion_protection: false,
            pitr: PitrState::default(),
        }
    }

    #[test]
    fn test_backup_settles_after_reads() {
        let cloud = InMemoryCloud::new().with_settle_after(2);
        cloud.put_table(active("parks"));

        let backup = cloud.create_backup("parks", "parks--orig-1").unwrap();
        assert_eq!(backup.status, BackupStatus::Creating);

        let first = cloud.list_backups(Some("parks")).unwrap();
        assert_eq!(first[0].status, BackupStatus::Creating);
        let second = cloud.list_backups(Some("parks")).unwrap();
        assert_eq!(second[0].status, BackupStatus::Available);
    }

    #[test]
    fn test_deleted_table_lingers_then_disappears() {
        let cloud = InMemoryCloud::new().with_settle_after(1);
        cloud.put_table(active("parks"));

        let desc = cloud.delete_table("parks").unwrap();
        assert_eq!(desc.status, TableStatus::Deleting);
        assert!(cloud.table("parks").is_some());
        assert!(cloud.list_tables().unwrap().is_empty());
    }

    #[test]
    fn test_protected_table_refuses_deletion() {
        let cloud = InMemoryCloud::new();
        cloud.put_table(TableDescriptor {
            deletion_protection: true,
            ..active("parks")
        });
        let err = cloud.delete_table("parks").unwrap_err();
        assert!(err.to_string().contains("deletion protection"));
        assert!(cloud.table("parks").is_some());
    }

    #[test]
    fn test_fail_next_fires_once_and_logs_call() {
        let cloud = InMemoryCloud::new();
        cloud.put_table(active("parks"));
        cloud.fail_next("CreateBackup", "LimitExceededException");

        assert!(cloud.create_backup("parks", "b1").is_err());
        assert!(cloud.create_backup("parks", "b2").is_ok());
        assert_eq!(cloud.call_count("CreateBackup"), 2);
    }

    #[test]
    fn test_fail_next_on_skips_other_targets() {
        let cloud = InMemoryCloud::new();
        cloud.put_table(active("parks"));
        cloud.put_table(active("rides"));
        cloud.fail_next_on("CreateBackup", "rides", "LimitExceededException");

        assert!(cloud.create_backup("parks", "b1").is_ok());
        assert!(cloud.create_backup("rides", "b2").is_err());
        assert!(cloud.create_backup("rides", "b3").is_ok());
    }

    #[test]
    fn test_created_backup_never_replaces_seeded_one() {
        let cloud = InMemoryCloud::new();
        cloud.put_table(active("parks"));
        let seeded = BackupDescriptor {
            arn: "arn:sim:dynamodb:local:000000000000:table/parks/backup/00000000000000001"
                .to_string(),
            name: "parks--manual-20240520120000".to_string(),
            table: "parks".to_string(),
            created_at: None,
            status: BackupStatus::Available,
        };
        cloud.put_backup(seeded.clone());

        let created = cloud.create_backup("parks", "parks--orig-1").unwrap();
        assert_ne!(created.arn, seeded.arn);

        let backups = cloud.backups();
        assert_eq!(backups.len(), 2);
        assert!(backups.contains(&seeded));
    }

    #[test]
    fn test_backups_stamped_with_shared_clock() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        let cloud = InMemoryCloud::new().with_clock(clock.clone());
        cloud.put_table(active("parks"));

        clock.sleep(std::time::Duration::from_secs(60));
        let backup = cloud.create_backup("parks", "b1").unwrap();
        assert_eq!(backup.created_at, Some(start + chrono::Duration::seconds(60)));

        let pitr = cloud.enable_pitr("parks").unwrap();
        assert_eq!(pitr.latest, Some(start + chrono::Duration::seconds(60)));
    }

    #[test]
    fn test_restore_refuses_existing_target() {
        let cloud = InMemoryCloud::new();
        cloud.put_table(active("parks"));
        let backup = cloud.create_backup("parks", "b1").unwrap();
        let err = cloud
            .restore_table_from_backup("parks", &backup.arn)
            .unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_vault_restore_creates_target() {
        let cloud = InMemoryCloud::new();
        cloud.put_recovery_point(
            "parks-vault",
            RecoveryPoint {
                arn: "arn:rp:1".into(),
                resource_name: "parks".into(),
                completed_at: None,
                status: RecoveryPointStatus::Completed,
                move_to_cold_at: None,
            },
        );

        let points = cloud.list_recovery_points("parks-vault", Some("parks")).unwrap();
        assert_eq!(points.len(), 1);
        assert!(cloud.list_recovery_points("parks-vault", Some("rides")).unwrap().is_empty());
        assert!(cloud.list_recovery_points("missing", None).is_err());

        let job = cloud
            .start_restore_job("arn:rp:1", "parks_restored", "arn:aws:iam::1:role/r")
            .unwrap();
        assert_eq!(job.target_table, "parks_restored");
        assert_eq!(cloud.table("parks_restored").unwrap().status, TableStatus::Active);
    }

    #[test]
    fn test_fixture_json() {
        let json = r#"{
            "settle_after": 1,
            "tables": [
                {"name": "parks", "status": "ACTIVE", "deletion_protection": true}
            ],
            "vaults": {"parks-vault": []}
        }"#;
        let fixture: CloudFixture = serde_json::from_str(json).unwrap();
        let cloud = InMemoryCloud::from_fixture(fixture);
        assert!(cloud.table("parks").unwrap().deletion_protection);
        assert!(cloud.list_recovery_points("parks-vault", None).unwrap().is_empty());
    }
}

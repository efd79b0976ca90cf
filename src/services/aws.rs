//! DynamoDB + AWS Backup adapter (cargo feature `aws`).
//!
//! The engine is synchronous, so every SDK future is driven to completion on
//! a private current-thread Tokio runtime. One call is in flight at a time.

use std::sync::Arc;

use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::primitives::DateTime as SdkDateTime;
use aws_sdk_dynamodb::types::{
    ContinuousBackupsDescription, PointInTimeRecoverySpecification, PointInTimeRecoveryStatus,
    TableDescription,
};
use chrono::{DateTime, Utc};
use tokio::runtime::Runtime;
use tracing::debug;

use super::{
    BackupDescriptor, BackupVault, PitrState, RecoveryPoint, RestoreJob, TableDescriptor,
    TableStore,
};
use crate::error::{RescueError, Result};
use crate::types::{BackupStatus, RecoveryPointStatus, TableStatus};

/// Live table store and backup vault.
#[derive(Clone)]
pub struct AwsCloud {
    runtime: Arc<Runtime>,
    dynamodb: aws_sdk_dynamodb::Client,
    backup: aws_sdk_backup::Client,
}

impl AwsCloud {
    /// Load credentials and region from the environment; `region` overrides it.
    pub fn connect(region: Option<&str>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        let sdk_config = runtime.block_on(loader.load());
        debug!(region = ?sdk_config.region(), "aws config loaded");

        Ok(Self {
            dynamodb: aws_sdk_dynamodb::Client::new(&sdk_config),
            backup: aws_sdk_backup::Client::new(&sdk_config),
            runtime: Arc::new(runtime),
        })
    }
}

fn sdk_error<E: std::error::Error>(action: &str, err: E) -> RescueError {
    RescueError::external(action, DisplayErrorContext(err).to_string())
}

fn to_chrono(at: &SdkDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(at.secs(), at.subsec_nanos())
}

fn to_sdk(at: DateTime<Utc>) -> SdkDateTime {
    SdkDateTime::from_secs_and_nanos(at.timestamp(), at.timestamp_subsec_nanos())
}

fn table_status(raw: Option<&str>) -> TableStatus {
    raw.and_then(|s| s.parse().ok()).unwrap_or(TableStatus::Updating)
}

fn pitr_state(desc: Option<&ContinuousBackupsDescription>) -> PitrState {
    let Some(pitr) = desc.and_then(|d| d.point_in_time_recovery_description()) else {
        return PitrState::default();
    };
    PitrState {
        enabled: pitr.point_in_time_recovery_status() == Some(&PointInTimeRecoveryStatus::Enabled),
        earliest: pitr.earliest_restorable_date_time().and_then(to_chrono),
        latest: pitr.latest_restorable_date_time().and_then(to_chrono),
    }
}

fn table_descriptor(action: &str, desc: Option<&TableDescription>) -> Result<TableDescriptor> {
    let desc = desc.ok_or_else(|| RescueError::external(action, "response had no table description"))?;
    Ok(TableDescriptor {
        name: desc.table_name().unwrap_or_default().to_string(),
        status: table_status(desc.table_status().map(|s| s.as_str())),
        deletion_protection: desc.deletion_protection_enabled().unwrap_or(false),
        pitr: PitrState::default(),
    })
}

impl TableStore for AwsCloud {
    fn list_tables(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut start: Option<String> = None;
        loop {
            let page = self
                .runtime
                .block_on(
                    self.dynamodb
                        .list_tables()
                        .set_exclusive_start_table_name(start.take())
                        .send(),
                )
                .map_err(|e| sdk_error("ListTables", e))?;
            names.extend(page.table_names().iter().cloned());
            match page.last_evaluated_table_name() {
                Some(last) => start = Some(last.to_string()),
                None => return Ok(names),
            }
        }
    }

    fn describe_table(&self, name: &str) -> Result<Option<TableDescriptor>> {
        let output = match self
            .runtime
            .block_on(self.dynamodb.describe_table().table_name(name).send())
        {
            Ok(output) => output,
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_not_found_exception()) =>
            {
                return Ok(None);
            }
            Err(err) => return Err(sdk_error("DescribeTable", err)),
        };
        let mut table = table_descriptor("DescribeTable", output.table())?;
        if table.status == TableStatus::Active {
            table.pitr = self.describe_continuous_backups(name)?;
        }
        Ok(Some(table))
    }

    fn table_status(&self, name: &str) -> Result<Option<TableStatus>> {
        match self
            .runtime
            .block_on(self.dynamodb.describe_table().table_name(name).send())
        {
            Ok(output) => Ok(Some(table_status(
                output
                    .table()
                    .and_then(|t| t.table_status())
                    .map(|s| s.as_str()),
            ))),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_not_found_exception()) =>
            {
                Ok(None)
            }
            Err(err) => Err(sdk_error("DescribeTable", err)),
        }
    }

    fn describe_continuous_backups(&self, name: &str) -> Result<PitrState> {
        let output = self
            .runtime
            .block_on(
                self.dynamodb
                    .describe_continuous_backups()
                    .table_name(name)
                    .send(),
            )
            .map_err(|e| sdk_error("DescribeContinuousBackups", e))?;
        Ok(pitr_state(output.continuous_backups_description()))
    }

    fn create_backup(&self, table: &str, backup_name: &str) -> Result<BackupDescriptor> {
        let output = self
            .runtime
            .block_on(
                self.dynamodb
                    .create_backup()
                    .table_name(table)
                    .backup_name(backup_name)
                    .send(),
            )
            .map_err(|e| sdk_error("CreateBackup", e))?;
        let details = output
            .backup_details()
            .ok_or_else(|| RescueError::external("CreateBackup", "response had no backup details"))?;
        Ok(BackupDescriptor {
            arn: details.backup_arn().to_string(),
            name: details.backup_name().to_string(),
            table: table.to_string(),
            created_at: to_chrono(details.backup_creation_date_time()),
            status: details
                .backup_status()
                .as_str()
                .parse()
                .unwrap_or(BackupStatus::Creating),
        })
    }

    fn list_backups(&self, table: Option<&str>) -> Result<Vec<BackupDescriptor>> {
        let mut backups = Vec::new();
        let mut start: Option<String> = None;
        loop {
            let page = self
                .runtime
                .block_on(
                    self.dynamodb
                        .list_backups()
                        .set_table_name(table.map(str::to_string))
                        .set_exclusive_start_backup_arn(start.take())
                        .send(),
                )
                .map_err(|e| sdk_error("ListBackups", e))?;
            backups.extend(page.backup_summaries().iter().map(|summary| BackupDescriptor {
                arn: summary.backup_arn().unwrap_or_default().to_string(),
                name: summary.backup_name().unwrap_or_default().to_string(),
                table: summary.table_name().unwrap_or_default().to_string(),
                created_at: summary.backup_creation_date_time().and_then(to_chrono),
                status: summary
                    .backup_status()
                    .and_then(|s| s.as_str().parse().ok())
                    .unwrap_or(BackupStatus::Creating),
            }));
            match page.last_evaluated_backup_arn() {
                Some(last) => start = Some(last.to_string()),
                None => return Ok(backups),
            }
        }
    }

    fn delete_backup(&self, backup_arn: &str) -> Result<()> {
        self.runtime
            .block_on(self.dynamodb.delete_backup().backup_arn(backup_arn).send())
            .map_err(|e| sdk_error("DeleteBackup", e))?;
        Ok(())
    }

    fn delete_table(&self, name: &str) -> Result<TableDescriptor> {
        let output = self
            .runtime
            .block_on(self.dynamodb.delete_table().table_name(name).send())
            .map_err(|e| sdk_error("DeleteTable", e))?;
        table_descriptor("DeleteTable", output.table_description())
    }

    fn restore_table_from_backup(
        &self,
        target_table: &str,
        backup_arn: &str,
    ) -> Result<TableDescriptor> {
        let output = self
            .runtime
            .block_on(
                self.dynamodb
                    .restore_table_from_backup()
                    .target_table_name(target_table)
                    .backup_arn(backup_arn)
                    .send(),
            )
            .map_err(|e| sdk_error("RestoreTableFromBackup", e))?;
        table_descriptor("RestoreTableFromBackup", output.table_description())
    }

    fn restore_table_to_point_in_time(
        &self,
        source_table: &str,
        target_table: &str,
        restore_at: DateTime<Utc>,
    ) -> Result<TableDescriptor> {
        let output = self
            .runtime
            .block_on(
                self.dynamodb
                    .restore_table_to_point_in_time()
                    .source_table_name(source_table)
                    .target_table_name(target_table)
                    .restore_date_time(to_sdk(restore_at))
                    .send(),
            )
            .map_err(|e| sdk_error("RestoreTableToPointInTime", e))?;
        table_descriptor("RestoreTableToPointInTime", output.table_description())
    }

    fn set_deletion_protection(&self, name: &str, enabled: bool) -> Result<TableDescriptor> {
        let output = self
            .runtime
            .block_on(
                self.dynamodb
                    .update_table()
                    .table_name(name)
                    .deletion_protection_enabled(enabled)
                    .send(),
            )
            .map_err(|e| sdk_error("UpdateTable", e))?;
        table_descriptor("UpdateTable", output.table_description())
    }

    fn enable_pitr(&self, name: &str) -> Result<PitrState> {
        let spec = PointInTimeRecoverySpecification::builder()
            .point_in_time_recovery_enabled(true)
            .build()
            .map_err(|e| sdk_error("UpdateContinuousBackups", e))?;
        let output = self
            .runtime
            .block_on(
                self.dynamodb
                    .update_continuous_backups()
                    .table_name(name)
                    .point_in_time_recovery_specification(spec)
                    .send(),
            )
            .map_err(|e| sdk_error("UpdateContinuousBackups", e))?;
        Ok(pitr_state(output.continuous_backups_description()))
    }
}

impl BackupVault for AwsCloud {
    fn list_recovery_points(
        &self,
        vault: &str,
        resource_name: Option<&str>,
    ) -> Result<Vec<RecoveryPoint>> {
        let mut points = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let page = self
                .runtime
                .block_on(
                    self.backup
                        .list_recovery_points_by_backup_vault()
                        .backup_vault_name(vault)
                        .set_next_token(token.take())
                        .send(),
                )
                .map_err(|e| sdk_error("ListRecoveryPointsByBackupVault", e))?;
            points.extend(
                page.recovery_points()
                    .iter()
                    .filter(|rp| resource_name.is_none_or(|r| rp.resource_name() == Some(r)))
                    .map(|rp| RecoveryPoint {
                        arn: rp.recovery_point_arn().unwrap_or_default().to_string(),
                        resource_name: rp.resource_name().unwrap_or_default().to_string(),
                        completed_at: rp.completion_date().and_then(to_chrono),
                        status: rp
                            .status()
                            .and_then(|s| s.as_str().parse().ok())
                            .unwrap_or(RecoveryPointStatus::Partial),
                        move_to_cold_at: rp
                            .calculated_lifecycle()
                            .and_then(|l| l.move_to_cold_storage_at())
                            .and_then(to_chrono),
                    }),
            );
            match page.next_token() {
                Some(next) => token = Some(next.to_string()),
                None => return Ok(points),
            }
        }
    }

    fn start_restore_job(
        &self,
        recovery_point_arn: &str,
        target_table: &str,
        iam_role_arn: &str,
    ) -> Result<RestoreJob> {
        let output = self
            .runtime
            .block_on(
                self.backup
                    .start_restore_job()
                    .recovery_point_arn(recovery_point_arn)
                    .iam_role_arn(iam_role_arn)
                    .resource_type("DynamoDB")
                    .metadata("targetTableName", target_table)
                    .send(),
            )
            .map_err(|e| sdk_error("StartRestoreJob", e))?;
        Ok(RestoreJob {
            job_id: output.restore_job_id().unwrap_or_default().to_string(),
            target_table: target_table.to_string(),
        })
    }
}

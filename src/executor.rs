//! Operation executor.
//!
//! A [`Session`] bundles the services, the operator gateway, the clock and
//! the polling policy. Each step method begins a fresh record in the run
//! context, invokes exactly one external action, stores the response and the
//! check arguments, then verifies the post-condition through
//! [`check_and_update`]. Errors mark the record failed and are returned
//! unchanged; nothing here catches.

use chrono::{DateTime, Utc};
use tracing::{error, info};

use crate::error::{RescueError, Result};
use crate::gateway::{Gateway, Notice, Prompt};
use crate::operation::{
    ActionResponse, CheckArgs, CheckKind, CheckValue, CustomCheck, OpKind, OperationRecord,
    SelectedBackup,
};
use crate::poller::{Clock, Poller};
use crate::run_context::RunContext;
use crate::services::{BackupDescriptor, BackupVault, RecoveryPoint, TableStore};
use crate::types::TableStatus;
use crate::verify::{Verifier, check_and_update};

/// Per-process settings the steps need besides their arguments.
#[derive(Debug, Clone, Default)]
pub struct RecoverySettings {
    pub vault_name: String,
    pub restore_role_arn: String,
    /// System table never offered as a target
    pub reserved_table: Option<String>,
}

/// Everything one operator session needs to run steps.
pub struct Session<'a> {
    pub store: &'a dyn TableStore,
    pub vault: &'a dyn BackupVault,
    pub gateway: &'a mut dyn Gateway,
    pub clock: &'a dyn Clock,
    pub poller: Poller,
    pub settings: RecoverySettings,
}

impl<'a> Session<'a> {
    pub fn new(
        store: &'a dyn TableStore,
        vault: &'a dyn BackupVault,
        gateway: &'a mut dyn Gateway,
        clock: &'a dyn Clock,
        poller: Poller,
        settings: RecoverySettings,
    ) -> Self {
        Self {
            store,
            vault,
            gateway,
            clock,
            poller,
            settings,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn notify(&mut self, notice: Notice, message: &str) {
        self.gateway.notify(notice, message);
    }

    // ========================================================================
    // Predicates
    // ========================================================================

    /// Poll until `name` is listed and ACTIVE (`should_exist`), or until it is
    /// no longer listed at all. Returns the state that was reached.
    pub fn table_exists(&mut self, name: &str, should_exist: bool) -> Result<bool> {
        let store = self.store;
        let waiting_for = if should_exist {
            format!("table {} to become ACTIVE", name)
        } else {
            format!("table {} to be deleted", name)
        };
        self.poller.poll(
            self.clock,
            &mut *self.gateway,
            &waiting_for,
            should_exist,
            || {
                let listed = store.list_tables()?.iter().any(|t| t == name);
                if !should_exist || !listed {
                    return Ok(listed);
                }
                Ok(store.table_status(name)? == Some(TableStatus::Active))
            },
        )
    }

    /// Poll until a backup of `table` called `backup_name` is AVAILABLE.
    pub fn backup_exists(&mut self, table: &str, backup_name: &str) -> Result<bool> {
        let store = self.store;
        let waiting_for = format!("backup {} of {} to become AVAILABLE", backup_name, table);
        self.poller
            .poll(self.clock, &mut *self.gateway, &waiting_for, true, || {
                Ok(store
                    .list_backups(Some(table))?
                    .iter()
                    .any(|b| b.table == table && b.name == backup_name && b.is_available()))
            })
    }

    fn pitr_enabled(&mut self, table: &str) -> Result<bool> {
        let store = self.store;
        let waiting_for = format!("point-in-time recovery on {}", table);
        self.poller
            .poll(self.clock, &mut *self.gateway, &waiting_for, true, || {
                Ok(store.describe_continuous_backups(table)?.enabled)
            })
    }

    fn deletion_protection_enabled(&mut self, table: &str) -> Result<bool> {
        let store = self.store;
        let waiting_for = format!("deletion protection on {}", table);
        self.poller
            .poll(self.clock, &mut *self.gateway, &waiting_for, true, || {
                Ok(store
                    .describe_table(table)?
                    .is_some_and(|t| t.deletion_protection))
            })
    }

    // ========================================================================
    // Gates
    // ========================================================================

    /// Yes/no, then the operator types the table name back.
    pub fn destructive_confirm(&mut self, question: &str, table: &str) -> Result<bool> {
        let prompt = Prompt::new(question).with_help(
            "This cannot be undone. Answer no to stop here; the step will be marked failed \
             and you will be offered a cleanup of anything created so far.",
        );
        if !self.gateway.confirm(&prompt)? {
            return Ok(false);
        }

        let retype = format!("Type the table name ({}) to confirm", table);
        let expected = table.to_string();
        self.gateway.text(
            &Prompt::new(&retype).with_help("Type `menu` to back out."),
            &move |answer: &str| {
                if answer == expected {
                    Ok(())
                } else {
                    Err(format!("'{}' does not match '{}'", answer, expected))
                }
            },
        )?;
        Ok(true)
    }

    // ========================================================================
    // Step runner
    // ========================================================================

    /// Begin `kind`, let `fill` set the record's inputs, run `action`, verify.
    fn run_step<F, A>(&mut self, ctx: &mut RunContext, kind: OpKind, fill: F, action: A) -> Result<()>
    where
        F: FnOnce(&mut OperationRecord),
        A: FnOnce(&mut Self) -> Result<(ActionResponse, CheckArgs)>,
    {
        let record = ctx.begin(kind)?;
        fill(record);

        info!(operation = %record.operation_name, step = %kind, "step start");
        self.gateway
            .notify(Notice::Info, &format!("Starting: {}", record.operation_name));

        let outcome = match action(self) {
            Ok((response, args)) => {
                record.response = Some(response);
                record.args = Some(args);
                check_and_update(self, record)
            }
            Err(err) => {
                record.mark_failed(&err);
                Err(err)
            }
        };

        match &outcome {
            Ok(()) => {
                info!(operation = %record.operation_name, step = %kind, "step succeeded");
                self.gateway
                    .notify(Notice::Success, &format!("Done: {}", record.operation_name));
            }
            Err(err) => {
                error!(operation = %record.operation_name, step = %kind, error = %err, "step failed");
                if !err.is_operator_exit() {
                    self.gateway.notify(
                        Notice::Error,
                        &format!("{} failed: {}", record.operation_name, err),
                    );
                }
            }
        }
        outcome
    }

    // ========================================================================
    // Steps
    // ========================================================================

    /// Copy `source` as it was at `restore_at` into a new table `target`.
    pub fn duplicate_table(
        &mut self,
        ctx: &mut RunContext,
        source: &str,
        target: &str,
        restore_at: DateTime<Utc>,
    ) -> Result<()> {
        self.run_step(
            ctx,
            OpKind::Duplicate,
            |record| {
                record.source_table = Some(source.to_string());
                record.target_table = Some(target.to_string());
                record.restore_point_in_time = Some(restore_at);
            },
            |session| {
                let table = session
                    .store
                    .restore_table_to_point_in_time(source, target, restore_at)?;
                Ok((
                    ActionResponse::Table(table),
                    CheckArgs::Table {
                        table: target.to_string(),
                        should_exist: true,
                    },
                ))
            },
        )
    }

    /// On-demand backup of `table`. `kind` is `BackupOriginal` or `BackupDuplicate`.
    pub fn backup_table(
        &mut self,
        ctx: &mut RunContext,
        kind: OpKind,
        table: &str,
        backup_name: &str,
    ) -> Result<()> {
        if !matches!(kind, OpKind::BackupOriginal | OpKind::BackupDuplicate) {
            return Err(RescueError::state(format!("{} is not a backup step", kind)));
        }
        self.run_step(
            ctx,
            kind,
            |record| {
                record.source_table = Some(table.to_string());
                record.backup_name = Some(backup_name.to_string());
            },
            |session| {
                let backup = session.store.create_backup(table, backup_name)?;
                Ok((
                    ActionResponse::Backup(backup),
                    CheckArgs::Backup {
                        table: table.to_string(),
                        backup: backup_name.to_string(),
                    },
                ))
            },
        )
    }

    /// Delete `table` after the deletion-protection and confirmation gates.
    ///
    /// # Errors
    ///
    /// `Declined` if the operator refuses either gate; no delete call is made.
    pub fn delete_table(&mut self, ctx: &mut RunContext, table: &str) -> Result<()> {
        self.run_step(
            ctx,
            OpKind::DeleteOriginal,
            |record| record.source_table = Some(table.to_string()),
            |session| {
                let current = session.store.describe_table(table)?.ok_or_else(|| {
                    RescueError::validation(format!("table {} does not exist", table))
                })?;

                let was_protected = current.deletion_protection;
                if was_protected {
                    let question = format!(
                        "Table {} has deletion protection enabled. Disable it so the table can be deleted?",
                        table
                    );
                    if !session.destructive_confirm(&question, table)? {
                        return Err(RescueError::declined(format!(
                            "disabling deletion protection on {}",
                            table
                        )));
                    }
                    session.store.set_deletion_protection(table, false)?;
                    info!(table, "deletion protection disabled");
                }

                let question = format!("Permanently delete table {}?", table);
                let refusal = match session.destructive_confirm(&question, table) {
                    Ok(true) => None,
                    Ok(false) => Some(RescueError::declined(format!("deleting {}", table))),
                    Err(err) => Some(err),
                };
                if let Some(err) = refusal {
                    if was_protected {
                        session.store.set_deletion_protection(table, true)?;
                        info!(table, "deletion protection restored");
                    }
                    return Err(err);
                }

                let deleted = session.store.delete_table(table)?;
                Ok((
                    ActionResponse::Table(deleted),
                    CheckArgs::Table {
                        table: table.to_string(),
                        should_exist: false,
                    },
                ))
            },
        )
    }

    /// Restore an on-demand backup into `target`.
    pub fn restore_from_backup(
        &mut self,
        ctx: &mut RunContext,
        target: &str,
        backup: &BackupDescriptor,
    ) -> Result<()> {
        self.run_step(
            ctx,
            OpKind::RestoreNative,
            |record| {
                record.source_table = Some(backup.table.clone());
                record.target_table = Some(target.to_string());
                record.backup = Some(SelectedBackup::Native(backup.clone()));
            },
            |session| {
                let table = session.store.restore_table_from_backup(target, &backup.arn)?;
                Ok((
                    ActionResponse::Table(table),
                    CheckArgs::Table {
                        table: target.to_string(),
                        should_exist: true,
                    },
                ))
            },
        )
    }

    /// Start a vault restore job into `target` and wait for the table.
    pub fn restore_from_vault(
        &mut self,
        ctx: &mut RunContext,
        target: &str,
        point: &RecoveryPoint,
    ) -> Result<()> {
        self.run_step(
            ctx,
            OpKind::RestoreVault,
            |record| {
                record.source_table = Some(point.resource_name.clone());
                record.target_table = Some(target.to_string());
                record.backup = Some(SelectedBackup::Vault(point.clone()));
            },
            |session| {
                let job = session.vault.start_restore_job(
                    &point.arn,
                    target,
                    &session.settings.restore_role_arn,
                )?;
                info!(job_id = %job.job_id, target, "vault restore job started");
                Ok((
                    ActionResponse::RestoreJob(job),
                    CheckArgs::Table {
                        table: target.to_string(),
                        should_exist: true,
                    },
                ))
            },
        )
    }

    pub fn enable_pitr(&mut self, ctx: &mut RunContext, table: &str) -> Result<()> {
        self.run_step(
            ctx,
            OpKind::EnablePitr,
            |record| record.target_table = Some(table.to_string()),
            |session| {
                let state = session.store.enable_pitr(table)?;
                Ok((
                    ActionResponse::ContinuousBackups(state),
                    CheckArgs::Target {
                        table: table.to_string(),
                    },
                ))
            },
        )
    }

    pub fn enable_deletion_protection(&mut self, ctx: &mut RunContext, table: &str) -> Result<()> {
        self.run_step(
            ctx,
            OpKind::EnableDeletionProtection,
            |record| record.target_table = Some(table.to_string()),
            |session| {
                let desc = session.store.set_deletion_protection(table, true)?;
                Ok((
                    ActionResponse::Table(desc),
                    CheckArgs::Target {
                        table: table.to_string(),
                    },
                ))
            },
        )
    }
}

impl Verifier for Session<'_> {
    fn verify(&mut self, check: CheckKind, args: &CheckArgs) -> Result<CheckValue> {
        let value = match (check, args) {
            (CheckKind::TableExists, CheckArgs::Table {
                table,
                should_exist,
            }) => self.table_exists(table, *should_exist)?,
            (CheckKind::BackupExists, CheckArgs::Backup { table, backup }) => {
                self.backup_exists(table, backup)?
            }
            (CheckKind::Custom(CustomCheck::PitrEnabled), CheckArgs::Target { table }) => {
                self.pitr_enabled(table)?
            }
            (CheckKind::Custom(CustomCheck::DeletionProtectionEnabled), CheckArgs::Target { table }) => {
                self.deletion_protection_enabled(table)?
            }
            (check, args) => {
                return Err(RescueError::state(format!(
                    "no predicate for {} with {:?}",
                    check, args
                )));
            }
        };
        Ok(CheckValue::Bool(value))
    }
}

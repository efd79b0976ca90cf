//! Run Context
//!
//! Per-run, authoritative record of which steps a workflow has begun and how
//! each one ended. Workflows pass it through every step; the compensator and
//! the journal read it afterwards.
//!
//! # Design Principles
//!
//! - **Fresh per run**: a context is built empty for every workflow run and
//!   every step gets a brand-new record from the registry
//! - **Validated transitions**: a step can only begin while every earlier step
//!   has succeeded, and each step at most once per run
//! - **Inspectable**: the whole context serializes to JSON
//!
//! # Step Flow (PITR restore, the longest workflow)
//!
//! ```text
//! duplicate
//!     ↓
//! backup_original
//!     ↓
//! backup_duplicate
//!     ↓
//! delete_original
//!     ↓
//! restore_native
//!     ↓
//! enable_pitr
//!     ↓
//! enable_deletion_protection
//!
//! (any step can end Failed, which stops the chain)
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::operation::{OpKind, OperationRecord};

/// Errors that can occur when beginning a step
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunTransitionError {
    /// An earlier step has not reached success
    #[error("Cannot begin {next} while {pending} is {status}")]
    PredecessorIncomplete {
        pending: OpKind,
        status: crate::operation::OpStatus,
        next: OpKind,
    },

    /// The step already ran in this context
    #[error("Step {kind} already ran in this run")]
    AlreadyBegun { kind: OpKind },
}

impl From<RunTransitionError> for crate::error::RescueError {
    fn from(err: RunTransitionError) -> Self {
        crate::error::RescueError::State(err.to_string())
    }
}

/// Operation records of one workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunContext {
    run_id: String,
    started_at: DateTime<Utc>,
    /// Workflow label, for the journal
    workflow: Option<String>,
    /// Table the operator targeted
    table: Option<String>,
    records: BTreeMap<OpKind, OperationRecord>,
    /// Steps in the order they began
    order: Vec<OpKind>,
}

impl RunContext {
    /// Create an empty context for a run starting at `started_at`.
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            run_id: format!("run-{}", started_at.format("%Y%m%dT%H%M%S%.3fZ")),
            started_at,
            workflow: None,
            table: None,
            records: BTreeMap::new(),
            order: Vec::new(),
        }
    }

    /// Create a context labelled with its workflow and target table.
    pub fn for_workflow(
        started_at: DateTime<Utc>,
        workflow: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        let mut ctx = Self::new(started_at);
        ctx.workflow = Some(workflow.into());
        ctx.table = Some(table.into());
        ctx
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn workflow(&self) -> Option<&str> {
        self.workflow.as_deref()
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Begin a step: insert a fresh record for `kind` and hand it out.
    ///
    /// # Errors
    ///
    /// - `PredecessorIncomplete` if any earlier step is pending or failed
    /// - `AlreadyBegun` if `kind` already ran in this context
    pub fn begin(&mut self, kind: OpKind) -> Result<&mut OperationRecord, RunTransitionError> {
        if self.records.contains_key(&kind) {
            return Err(RunTransitionError::AlreadyBegun { kind });
        }

        if let Some(pending) = self
            .order
            .iter()
            .filter_map(|k| self.records.get(k))
            .find(|record| !record.is_success())
        {
            return Err(RunTransitionError::PredecessorIncomplete {
                pending: pending.kind,
                status: pending.status,
                next: kind,
            });
        }

        self.order.push(kind);
        Ok(self.records.entry(kind).or_insert_with(|| kind.new_record()))
    }

    pub fn get(&self, kind: OpKind) -> Option<&OperationRecord> {
        self.records.get(&kind)
    }

    /// Records in the order their steps began
    pub fn records(&self) -> impl Iterator<Item = &OperationRecord> {
        self.order.iter().filter_map(|kind| self.records.get(kind))
    }

    pub fn failed_records(&self) -> impl Iterator<Item = &OperationRecord> {
        self.records().filter(|record| record.is_failed())
    }

    pub fn has_failures(&self) -> bool {
        self.failed_records().next().is_some()
    }

    /// True once at least one step began and every step succeeded
    pub fn is_complete(&self) -> bool {
        !self.order.is_empty() && self.records().all(|record| record.is_success())
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

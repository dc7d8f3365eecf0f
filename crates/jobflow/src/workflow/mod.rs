//! The job lifecycle engine.
//!
//! [`Workflow`] is the single entry point for state-changing operations.
//! Each operation runs in one IMMEDIATE transaction: the acting user is
//! re-loaded and checked, the job's current status is looked up in the
//! transition table, and the write is a conditional update on that status.
//! A failed operation leaves nothing behind.

pub mod allocation;
pub mod clock;
pub mod deadline;
mod jobs;
pub mod lifecycle;
mod registry;
pub mod tracker;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::db::{job_repo, user_repo, Database};
use crate::error::WorkflowError;
use crate::model::{Job, Role, User, UserId};

pub use allocation::AllocationTarget;
pub use clock::{Clock, FixedClock, SystemClock};
pub use deadline::DeadlinePolicy;
pub use jobs::{JobEdit, WriterProgress};
pub use lifecycle::JobAction;
pub use tracker::WriterQueue;

#[derive(Clone)]
pub struct Workflow {
    db: Database,
    clock: Arc<dyn Clock>,
    deadlines: DeadlinePolicy,
}

impl Workflow {
    pub fn new(db: Database) -> Self {
        Self::with_clock(db, Arc::new(SystemClock))
    }

    pub fn with_clock(db: Database, clock: Arc<dyn Clock>) -> Self {
        Self {
            db,
            clock,
            deadlines: DeadlinePolicy::default(),
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn deadlines(&self) -> &DeadlinePolicy {
        &self.deadlines
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

/// Loads the acting user and checks they may take part in role-gated work.
pub(crate) fn load_actor(
    conn: &Connection,
    actor: &UserId,
    action: &'static str,
) -> Result<User, WorkflowError> {
    let user = load_user(conn, actor)?;
    if !user.can_act() {
        return Err(unauthorized(&user, action));
    }
    Ok(user)
}

/// Loads the acting user and checks their role against `allowed`.
pub(crate) fn require_role(
    conn: &Connection,
    actor: &UserId,
    action: &'static str,
    allowed: impl Fn(Role) -> bool,
) -> Result<User, WorkflowError> {
    let user = load_actor(conn, actor, action)?;
    if !allowed(user.role) {
        return Err(unauthorized(&user, action));
    }
    Ok(user)
}

pub(crate) fn unauthorized(user: &User, action: &'static str) -> WorkflowError {
    WorkflowError::Unauthorized {
        actor: user.id.clone(),
        action,
        role: user.role,
    }
}

pub(crate) fn load_user(conn: &Connection, id: &UserId) -> Result<User, WorkflowError> {
    user_repo::find_by_id(conn, id)?.ok_or_else(|| WorkflowError::user_not_found(id))
}

pub(crate) fn load_job(conn: &Connection, job_id: &str) -> Result<Job, WorkflowError> {
    job_repo::find_by_job_id(conn, job_id)?.ok_or_else(|| WorkflowError::job_not_found(job_id))
}

/// Re-reads a job after a write in the same transaction.
pub(crate) fn reload_job(conn: &Connection, job: &Job) -> Result<Job, WorkflowError> {
    job_repo::find_by_row_id(conn, job.row_id)?
        .ok_or_else(|| WorkflowError::job_not_found(&job.job_id))
}

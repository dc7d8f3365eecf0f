//! Test harness for isolated workflow execution.
//!
//! Every harness owns its own database (in memory, or in a temp directory),
//! a `FixedClock` starting at [`t0`] and a seeded superadmin.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;

use jobflow::workflow::AllocationTarget;
use jobflow::{Database, FixedClock, Job, Role, User, UserId, Workflow};

use super::builders::{CompletionBuilder, NewJobBuilder, NewUserBuilder};

/// Monday morning, the fixed start of every harness clock.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap()
}

pub struct TestHarness {
    temp_dir: Option<TempDir>,
    pub db: Database,
    pub clock: Arc<FixedClock>,
    pub workflow: Workflow,
    pub superadmin: User,
}

impl TestHarness {
    /// In-memory database.
    pub fn new() -> Self {
        let db = Database::open_in_memory().expect("Failed to create test database");
        Self::with_db(db, None)
    }

    /// File-backed database inside a temp directory.
    pub fn on_disk() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db = Database::open(&temp_dir.path().join("data").join("jobflow.db"))
            .expect("Failed to open test database");
        Self::with_db(db, Some(temp_dir))
    }

    fn with_db(db: Database, temp_dir: Option<TempDir>) -> Self {
        let clock = Arc::new(FixedClock::new(t0()));
        let workflow = Workflow::with_clock(db.clone(), clock.clone());
        let superadmin = workflow
            .bootstrap_superadmin(NewUserBuilder::new("Root").build())
            .expect("Failed to seed superadmin");
        Self {
            temp_dir,
            db,
            clock,
            workflow,
            superadmin,
        }
    }

    pub fn db_path(&self) -> Option<PathBuf> {
        self.temp_dir
            .as_ref()
            .map(|d| d.path().join("data").join("jobflow.db"))
    }

    pub fn now(&self) -> DateTime<Utc> {
        use jobflow::Clock;
        self.clock.now()
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    /// Registers a user without approving them.
    pub fn pending_user(&self, first_name: &str) -> User {
        self.workflow
            .register_user(NewUserBuilder::new(first_name).build())
            .expect("Failed to register user")
    }

    /// Registers and approves a user with `role`.
    pub fn approved_user(&self, first_name: &str, role: Role) -> User {
        let pending = self.pending_user(first_name);
        self.workflow
            .approve_user(&self.superadmin.id, &pending.id, role)
            .expect("Failed to approve user")
    }

    /// Drops a job as `marketing`.
    pub fn drop_job(&self, marketing: &UserId, job_id: &str) -> Job {
        self.workflow
            .create_job(marketing, NewJobBuilder::new(job_id).build())
            .expect("Failed to create job")
    }

    /// Drops and completes a job; it ends in `pending_allocation`.
    pub fn ready_job(&self, marketing: &UserId, job_id: &str) -> Job {
        self.drop_job(marketing, job_id);
        self.workflow
            .complete_job(marketing, job_id, CompletionBuilder::new(self.now()).build())
            .expect("Failed to complete job")
    }

    /// Readies a job and allocates it to `writer`.
    pub fn allocated_job(
        &self,
        marketing: &UserId,
        allocator: &UserId,
        writer: &UserId,
        job_id: &str,
    ) -> Job {
        self.ready_job(marketing, job_id);
        self.workflow
            .allocate_job(allocator, job_id, AllocationTarget::Writer(writer.clone()))
            .expect("Failed to allocate job")
    }

    pub fn job(&self, job_id: &str) -> Job {
        self.db
            .with_conn(|conn| jobflow::db::job_repo::find_by_job_id(conn, job_id))
            .expect("query failed")
            .expect("job exists")
    }

    pub fn job_count(&self) -> u64 {
        self.db
            .with_conn(|conn| {
                jobflow::db::job_repo::count(conn, &jobflow::db::job_repo::JobFilter::new())
            })
            .expect("count failed")
    }
}

/// The cast most scenarios need.
pub struct Crew {
    pub marketing: User,
    pub allocator: User,
    pub writer: User,
    pub process: User,
}

impl TestHarness {
    pub fn crew(&self) -> Crew {
        Crew {
            marketing: self.approved_user("Mia", Role::Marketing),
            allocator: self.approved_user("Alex", Role::Allocator),
            writer: self.approved_user("Wren", Role::Writer),
            process: self.approved_user("Priya", Role::Process),
        }
    }
}

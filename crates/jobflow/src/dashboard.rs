//! Read-only projections for each role's landing page.
//!
//! Boards re-check the caller the same way workflow operations do, and read
//! their lists inside one transaction. The writer board is the
//! one exception to "read-only": it creates the submission record for the
//! job the writer is about to see.

use serde::Serialize;

use crate::db::job_repo::{self, JobFilter, JobOrder};
use crate::db::stats_repo::{self, AllocatorStats, ProcessStats, WriterStats};
use crate::db::user_repo::{self, UserFilter, UserOrder};
use crate::error::WorkflowError;
use crate::model::{ApprovalStatus, Job, JobStatus, Role, User, UserId, WriterSubmission};
use crate::workflow::tracker::{self, WriterQueue};
use crate::workflow::{require_role, Workflow};

/// How many recent items the "latest" lists show.
pub const RECENT_LIMIT: u64 = 10;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketingDashboard {
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocatorDashboard {
    pub pending_jobs: Vec<Job>,
    pub allocated_jobs: Vec<Job>,
    pub completed_jobs: Vec<Job>,
    pub writers: Vec<User>,
    pub process_users: Vec<User>,
    pub stats: AllocatorStats,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriterDashboard {
    #[serde(flatten)]
    pub queue: WriterQueue,
    /// Submission record of the visible job.
    pub submission: Option<WriterSubmission>,
    pub stats: WriterStats,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessDashboard {
    pub queue: Vec<Job>,
    pub in_processing: Vec<Job>,
    pub stats: ProcessStats,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    pub approved: Vec<User>,
    pub pending: Vec<User>,
    pub rejected: Vec<User>,
}

fn users_with_status(
    conn: &rusqlite::Connection,
    status: ApprovalStatus,
) -> Result<Vec<User>, crate::db::DatabaseError> {
    user_repo::list(
        conn,
        &UserFilter {
            approval_status: Some(status),
            order: UserOrder::NewestFirst,
            ..UserFilter::default()
        },
    )
}

impl Workflow {
    /// The creator's own jobs, newest first.
    pub fn marketing_dashboard(&self, actor: &UserId) -> Result<MarketingDashboard, WorkflowError> {
        self.database().with_tx(|tx| {
            let user = require_role(tx, actor, "view the marketing dashboard", |r| {
                r == Role::Marketing
            })?;
            Ok(MarketingDashboard {
                jobs: job_repo::query(tx, &JobFilter::new().created_by(&user.id))?,
            })
        })
    }

    pub fn allocator_dashboard(&self, actor: &UserId) -> Result<AllocatorDashboard, WorkflowError> {
        let now = self.now();
        let lists = self.database().with_tx(|conn| {
            require_role(conn, actor, "view the allocator dashboard", |r| {
                r.can_allocate()
            })?;

            let pending_jobs = job_repo::query(
                conn,
                &JobFilter::new()
                    .status(JobStatus::PendingAllocation)
                    .order_by(JobOrder::CompletedFormDesc),
            )?;
            let allocated_jobs = job_repo::query(
                conn,
                &JobFilter::new()
                    .statuses(stats_repo::ACTIVE_WRITER_STATUSES)
                    .order_by(JobOrder::AllocatedDesc),
            )?;
            let completed_jobs = job_repo::query(
                conn,
                &JobFilter::new()
                    .status(JobStatus::Completed)
                    .order_by(JobOrder::UpdatedDesc)
                    .limit(RECENT_LIMIT),
            )?;
            let writers = user_repo::list(conn, &UserFilter::eligible(Role::Writer))?;
            let process_users = user_repo::list(conn, &UserFilter::eligible(Role::Process))?;
            Ok::<_, WorkflowError>((
                pending_jobs,
                allocated_jobs,
                completed_jobs,
                writers,
                process_users,
            ))
        });
        let (pending_jobs, allocated_jobs, completed_jobs, writers, process_users) = lists?;

        Ok(AllocatorDashboard {
            pending_jobs,
            allocated_jobs,
            completed_jobs,
            writers,
            process_users,
            stats: stats_repo::allocator_stats(self.database(), now)?,
        })
    }

    /// The writer's queue. Only the earliest-deadline unsubmitted job is
    /// visible; its submission record is created on first view.
    pub fn writer_dashboard(&self, actor: &UserId) -> Result<WriterDashboard, WorkflowError> {
        let now = self.now();
        let (queue, submission) = self.database().with_tx(|tx| {
            let user = require_role(tx, actor, "view the writer dashboard", |r| {
                r == Role::Writer
            })?;
            let jobs = job_repo::query(
                tx,
                &JobFilter::new()
                    .allocated_to(&user.id)
                    .statuses([
                        JobStatus::Allocated,
                        JobStatus::InProgress,
                        JobStatus::Submitted,
                    ])
                    .order_by(JobOrder::DeadlineAsc),
            )?;

            let queue = tracker::partition_visibility(jobs);
            let submission = match queue.visible {
                Some(ref job) => Some(tracker::touch(tx, job, &user.id, now)?),
                None => None,
            };
            Ok::<_, WorkflowError>((queue, submission))
        })?;

        Ok(WriterDashboard {
            queue,
            submission,
            stats: stats_repo::writer_stats(self.database(), actor)?,
        })
    }

    pub fn process_dashboard(&self, actor: &UserId) -> Result<ProcessDashboard, WorkflowError> {
        let now = self.now();
        let lists = self.database().with_tx(|conn| {
            let user = require_role(conn, actor, "view the process dashboard", |r| {
                r == Role::Process
            })?;
            let mine = JobFilter::new().process_user(&user.id);

            let queue = job_repo::query(
                conn,
                &mine
                    .clone()
                    .status(JobStatus::ProcessingQueue)
                    .order_by(JobOrder::DeadlineAsc),
            )?;
            let in_processing = job_repo::query(
                conn,
                &mine
                    .status(JobStatus::Processing)
                    .order_by(JobOrder::ProcessAssignedDesc)
                    .limit(RECENT_LIMIT),
            )?;
            Ok::<_, WorkflowError>((queue, in_processing))
        });
        let (queue, in_processing) = lists?;

        Ok(ProcessDashboard {
            queue,
            in_processing,
            stats: stats_repo::process_stats(self.database(), actor, now)?,
        })
    }

    /// Users grouped by approval status, newest registrations first.
    pub fn admin_dashboard(&self, actor: &UserId) -> Result<AdminDashboard, WorkflowError> {
        self.database().with_tx(|tx| {
            require_role(tx, actor, "view the admin dashboard", |r| {
                r.can_manage_users()
            })?;
            Ok(AdminDashboard {
                approved: users_with_status(tx, ApprovalStatus::Approved)?,
                pending: users_with_status(tx, ApprovalStatus::Pending)?,
                rejected: users_with_status(tx, ApprovalStatus::Rejected)?,
            })
        })
    }
}

//! Writer submission tracking.
//!
//! Each writer-allocated job has at most one submission row. The row is
//! created the first time the writer touches the job, and the started /
//! submitted timestamps keep the first value written.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;

use crate::db::{submission_repo, DatabaseError};
use crate::model::{Job, JobStatus, UserId, WriterSubmission};

/// Returns the job's submission, creating it on first touch.
pub fn touch(
    conn: &Connection,
    job: &Job,
    writer: &UserId,
    now: DateTime<Utc>,
) -> Result<WriterSubmission, DatabaseError> {
    let (submission, created) = submission_repo::get_or_create(conn, job.row_id, writer, now)?;
    if created {
        tracing::debug!(job_id = %job.job_id, writer = %writer, "submission record created");
    }
    Ok(submission)
}

/// Marks work as started and returns the stored row.
pub fn mark_started(
    conn: &Connection,
    submission: &WriterSubmission,
    now: DateTime<Utc>,
) -> Result<WriterSubmission, DatabaseError> {
    submission_repo::mark_started(conn, submission.id, now)?;
    reload(conn, submission)
}

/// Marks the deliverables as submitted and returns the stored row.
pub fn mark_submitted(
    conn: &Connection,
    submission: &WriterSubmission,
    now: DateTime<Utc>,
) -> Result<WriterSubmission, DatabaseError> {
    submission_repo::mark_submitted(conn, submission.id, now)?;
    reload(conn, submission)
}

fn reload(
    conn: &Connection,
    submission: &WriterSubmission,
) -> Result<WriterSubmission, DatabaseError> {
    submission_repo::find_by_job(conn, submission.job_row_id)?.ok_or(
        DatabaseError::InvalidColumn {
            table: "writer_submissions",
            column: "id",
            value: submission.id.to_string(),
        },
    )
}

/// A writer's assigned jobs split into the one they may work on and the rest.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriterQueue {
    pub visible: Option<Job>,
    pub blurred: Vec<Job>,
}

/// Picks the first not-yet-submitted job as visible; everything else is blurred.
///
/// `jobs` must already be in deadline order.
pub fn partition_visibility(jobs: Vec<Job>) -> WriterQueue {
    let visible_idx = jobs.iter().position(|j| j.status != JobStatus::Submitted);

    let mut queue = WriterQueue::default();
    for (idx, job) in jobs.into_iter().enumerate() {
        if Some(idx) == visible_idx {
            queue.visible = Some(job);
        } else {
            queue.blurred.push(job);
        }
    }
    queue
}

//! Writer submission repository: persistence for `writer_submissions`.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::time::{format_timestamp, parse_optional_timestamp, parse_timestamp};
use super::{parse_column, DatabaseError};
use crate::model::{FileRef, FinalUpload, UserId, WriterSubmission};

const TABLE: &str = "writer_submissions";

/// A raw submission row from the database.
#[derive(Debug, Clone)]
struct SubmissionRow {
    id: i64,
    job_row_id: i64,
    writer_id: String,
    structure_file: Option<String>,
    final_copy: Option<String>,
    associate_file: Option<String>,
    final_summary: Option<String>,
    started_at: Option<String>,
    submitted_at: Option<String>,
    status: String,
    created_at: String,
    updated_at: String,
}

impl SubmissionRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            job_row_id: row.get("job_row_id")?,
            writer_id: row.get("writer_id")?,
            structure_file: row.get("structure_file")?,
            final_copy: row.get("final_copy")?,
            associate_file: row.get("associate_file")?,
            final_summary: row.get("final_summary")?,
            started_at: row.get("started_at")?,
            submitted_at: row.get("submitted_at")?,
            status: row.get("status")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn into_submission(self) -> Result<WriterSubmission, DatabaseError> {
        Ok(WriterSubmission {
            id: self.id,
            job_row_id: self.job_row_id,
            writer: UserId::from(self.writer_id),
            structure_file: self.structure_file.map(FileRef::new),
            final_copy: self.final_copy.map(FileRef::new),
            associate_file: self.associate_file.map(FileRef::new),
            final_summary: self.final_summary,
            started_at: parse_optional_timestamp(TABLE, "started_at", self.started_at.as_deref())?,
            submitted_at: parse_optional_timestamp(
                TABLE,
                "submitted_at",
                self.submitted_at.as_deref(),
            )?,
            status: parse_column(TABLE, "status", &self.status)?,
            created_at: parse_timestamp(TABLE, "created_at", &self.created_at)?,
            updated_at: parse_timestamp(TABLE, "updated_at", &self.updated_at)?,
        })
    }
}

/// Inserts an `assigned` row for the job unless one exists, then returns
/// whichever row is stored.
///
/// The insert and the read happen on one connection, so concurrent first
/// touches end up sharing a single row.
pub fn get_or_create(
    conn: &Connection,
    job_row_id: i64,
    writer: &UserId,
    at: DateTime<Utc>,
) -> Result<(WriterSubmission, bool), DatabaseError> {
    let at = format_timestamp(at);
    let inserted = conn.execute(
        "INSERT INTO writer_submissions (job_row_id, writer_id, status, created_at, updated_at)
         VALUES (?1, ?2, 'assigned', ?3, ?3)
         ON CONFLICT(job_row_id) DO NOTHING",
        params![job_row_id, writer.as_str(), at],
    )?;

    let submission = find_by_job(conn, job_row_id)?.ok_or(DatabaseError::InvalidColumn {
        table: TABLE,
        column: "job_row_id",
        value: job_row_id.to_string(),
    })?;
    Ok((submission, inserted == 1))
}

/// Finds the submission paired with a job.
pub fn find_by_job(
    conn: &Connection,
    job_row_id: i64,
) -> Result<Option<WriterSubmission>, DatabaseError> {
    conn.query_row(
        "SELECT * FROM writer_submissions WHERE job_row_id = ?1",
        params![job_row_id],
        SubmissionRow::from_row,
    )
    .optional()?
    .map(SubmissionRow::into_submission)
    .transpose()
}

/// Sets `started_at` if unset and asserts status `in_progress`.
pub fn mark_started(conn: &Connection, id: i64, at: DateTime<Utc>) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE writer_submissions SET started_at = COALESCE(started_at, ?2),
         status = 'in_progress', updated_at = ?2 WHERE id = ?1",
        params![id, format_timestamp(at)],
    )?;
    Ok(changed)
}

/// Sets `submitted_at` if unset and asserts status `submitted`.
pub fn mark_submitted(
    conn: &Connection,
    id: i64,
    at: DateTime<Utc>,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE writer_submissions SET submitted_at = COALESCE(submitted_at, ?2),
         status = 'submitted', updated_at = ?2 WHERE id = ?1",
        params![id, format_timestamp(at)],
    )?;
    Ok(changed)
}

/// Records the structure outline upload.
pub fn set_structure(
    conn: &Connection,
    id: i64,
    file: &FileRef,
    at: DateTime<Utc>,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE writer_submissions SET structure_file = ?2, updated_at = ?3 WHERE id = ?1",
        params![id, file.as_str(), format_timestamp(at)],
    )?;
    Ok(changed)
}

/// Records the final deliverables. Fields left `None` keep their stored value.
pub fn set_final(
    conn: &Connection,
    id: i64,
    upload: &FinalUpload,
    at: DateTime<Utc>,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE writer_submissions SET final_copy = COALESCE(?2, final_copy),
         associate_file = COALESCE(?3, associate_file),
         final_summary = COALESCE(?4, final_summary), updated_at = ?5
         WHERE id = ?1",
        params![
            id,
            upload.final_copy.as_ref().map(FileRef::as_str),
            upload.associate_file.as_ref().map(FileRef::as_str),
            upload.final_summary,
            format_timestamp(at),
        ],
    )?;
    Ok(changed)
}

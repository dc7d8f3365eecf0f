//! Job repository: persistence for the `jobs` table.
//!
//! Every status change is a conditional `UPDATE ... WHERE status = <expected>`;
//! callers treat a zero row count as "someone else moved the job first".

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::time::{format_timestamp, parse_optional_timestamp, parse_timestamp};
use super::{parse_column, DatabaseError};
use crate::model::{Amount, Assignment, CompletionDetails, FileRef, Job, JobStatus, UserId};

const TABLE: &str = "jobs";

/// A raw job row from the database.
#[derive(Debug, Clone)]
struct JobRow {
    id: i64,
    job_id: String,
    instructions: String,
    attachment: Option<String>,
    created_by: String,
    topic: Option<String>,
    word_count: Option<u32>,
    referencing_style: Option<String>,
    writing_style: Option<String>,
    completion_instructions: Option<String>,
    expected_deadline: Option<String>,
    strict_deadline: Option<String>,
    amount_cents: Option<i64>,
    status: String,
    allocated_to: Option<String>,
    allocated_by: Option<String>,
    allocated_at: Option<String>,
    process_user: Option<String>,
    process_assigned_at: Option<String>,
    completed_form_at: Option<String>,
    created_at: String,
    updated_at: String,
}

impl JobRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            job_id: row.get("job_id")?,
            instructions: row.get("instructions")?,
            attachment: row.get("attachment")?,
            created_by: row.get("created_by")?,
            topic: row.get("topic")?,
            word_count: row.get("word_count")?,
            referencing_style: row.get("referencing_style")?,
            writing_style: row.get("writing_style")?,
            completion_instructions: row.get("completion_instructions")?,
            expected_deadline: row.get("expected_deadline")?,
            strict_deadline: row.get("strict_deadline")?,
            amount_cents: row.get("amount_cents")?,
            status: row.get("status")?,
            allocated_to: row.get("allocated_to")?,
            allocated_by: row.get("allocated_by")?,
            allocated_at: row.get("allocated_at")?,
            process_user: row.get("process_user")?,
            process_assigned_at: row.get("process_assigned_at")?,
            completed_form_at: row.get("completed_form_at")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn assignment(&self) -> Result<Assignment, DatabaseError> {
        let missing = |column: &'static str| DatabaseError::InvalidColumn {
            table: TABLE,
            column,
            value: "NULL".to_string(),
        };

        match (&self.allocated_to, &self.process_user) {
            (None, None) => Ok(Assignment::Unallocated),
            (Some(writer), None) => Ok(Assignment::Writer {
                writer: UserId::from(writer.as_str()),
                allocated_by: UserId::from(
                    self.allocated_by.as_deref().ok_or_else(|| missing("allocated_by"))?,
                ),
                allocated_at: parse_timestamp(
                    TABLE,
                    "allocated_at",
                    self.allocated_at.as_deref().ok_or_else(|| missing("allocated_at"))?,
                )?,
            }),
            (None, Some(process_user)) => Ok(Assignment::Process {
                process_user: UserId::from(process_user.as_str()),
                assigned_by: UserId::from(
                    self.allocated_by.as_deref().ok_or_else(|| missing("allocated_by"))?,
                ),
                assigned_at: parse_timestamp(
                    TABLE,
                    "process_assigned_at",
                    self.process_assigned_at
                        .as_deref()
                        .ok_or_else(|| missing("process_assigned_at"))?,
                )?,
            }),
            (Some(writer), Some(_)) => Err(DatabaseError::InvalidColumn {
                table: TABLE,
                column: "process_user",
                value: format!("set alongside allocated_to={}", writer),
            }),
        }
    }

    fn into_job(self) -> Result<Job, DatabaseError> {
        let assignment = self.assignment()?;
        Ok(Job {
            row_id: self.id,
            job_id: self.job_id,
            instructions: self.instructions,
            attachment: self.attachment.map(FileRef::new),
            created_by: UserId::from(self.created_by),
            topic: self.topic,
            word_count: self.word_count,
            referencing_style: self.referencing_style,
            writing_style: self.writing_style,
            completion_instructions: self.completion_instructions,
            expected_deadline: parse_optional_timestamp(
                TABLE,
                "expected_deadline",
                self.expected_deadline.as_deref(),
            )?,
            strict_deadline: parse_optional_timestamp(
                TABLE,
                "strict_deadline",
                self.strict_deadline.as_deref(),
            )?,
            amount: self.amount_cents.map(Amount::from_cents),
            status: parse_column(TABLE, "status", &self.status)?,
            assignment,
            completed_form_at: parse_optional_timestamp(
                TABLE,
                "completed_form_at",
                self.completed_form_at.as_deref(),
            )?,
            created_at: parse_timestamp(TABLE, "created_at", &self.created_at)?,
            updated_at: parse_timestamp(TABLE, "updated_at", &self.updated_at)?,
        })
    }
}

/// Sort order for job listings.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum JobOrder {
    #[default]
    NewestFirst,
    /// Most recently completed form first.
    CompletedFormDesc,
    /// Most recently allocated (writer path) first.
    AllocatedDesc,
    /// Most recently routed to the process queue first.
    ProcessAssignedDesc,
    /// Most recently touched first.
    UpdatedDesc,
    /// Earliest soft deadline first; jobs without one sort last.
    DeadlineAsc,
}

impl JobOrder {
    fn sql(&self) -> &'static str {
        match self {
            JobOrder::NewestFirst => "created_at DESC, id DESC",
            JobOrder::CompletedFormDesc => "completed_form_at DESC, id DESC",
            JobOrder::AllocatedDesc => "allocated_at DESC, id DESC",
            JobOrder::ProcessAssignedDesc => "process_assigned_at DESC, id DESC",
            JobOrder::UpdatedDesc => "updated_at DESC, id DESC",
            JobOrder::DeadlineAsc => "expected_deadline IS NULL, expected_deadline ASC, id ASC",
        }
    }
}

/// Composable query over jobs. Every setter narrows the result set.
#[derive(Debug, Default, Clone)]
pub struct JobFilter {
    pub statuses: Vec<JobStatus>,
    pub created_by: Option<UserId>,
    pub allocated_to: Option<UserId>,
    pub process_user: Option<UserId>,
    /// `strict_deadline < at`.
    pub strict_deadline_before: Option<DateTime<Utc>>,
    /// `from <= allocated_at < to`.
    pub allocated_between: Option<(DateTime<Utc>, DateTime<Utc>)>,
    /// `from <= process_assigned_at < to`.
    pub process_assigned_between: Option<(DateTime<Utc>, DateTime<Utc>)>,
    /// `from <= updated_at < to`.
    pub updated_between: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub order: JobOrder,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl JobFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(mut self, status: JobStatus) -> Self {
        self.statuses.push(status);
        self
    }

    pub fn statuses(mut self, statuses: impl IntoIterator<Item = JobStatus>) -> Self {
        self.statuses.extend(statuses);
        self
    }

    pub fn created_by(mut self, user: &UserId) -> Self {
        self.created_by = Some(user.clone());
        self
    }

    pub fn allocated_to(mut self, user: &UserId) -> Self {
        self.allocated_to = Some(user.clone());
        self
    }

    pub fn process_user(mut self, user: &UserId) -> Self {
        self.process_user = Some(user.clone());
        self
    }

    pub fn strict_deadline_before(mut self, at: DateTime<Utc>) -> Self {
        self.strict_deadline_before = Some(at);
        self
    }

    pub fn allocated_between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.allocated_between = Some((from, to));
        self
    }

    pub fn process_assigned_between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.process_assigned_between = Some((from, to));
        self
    }

    pub fn updated_between(mut self, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        self.updated_between = Some((from, to));
        self
    }

    pub fn order_by(mut self, order: JobOrder) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    fn where_clause(&self) -> (String, Vec<String>) {
        let mut conditions = Vec::new();
        let mut values: Vec<String> = Vec::new();

        if !self.statuses.is_empty() {
            let mut placeholders = Vec::with_capacity(self.statuses.len());
            for status in &self.statuses {
                values.push(status.as_str().to_string());
                placeholders.push(format!("?{}", values.len()));
            }
            conditions.push(format!("status IN ({})", placeholders.join(", ")));
        }
        if let Some(ref user) = self.created_by {
            values.push(user.as_str().to_string());
            conditions.push(format!("created_by = ?{}", values.len()));
        }
        if let Some(ref user) = self.allocated_to {
            values.push(user.as_str().to_string());
            conditions.push(format!("allocated_to = ?{}", values.len()));
        }
        if let Some(ref user) = self.process_user {
            values.push(user.as_str().to_string());
            conditions.push(format!("process_user = ?{}", values.len()));
        }
        if let Some(at) = self.strict_deadline_before {
            values.push(format_timestamp(at));
            conditions.push(format!("strict_deadline < ?{}", values.len()));
        }
        for (column, range) in [
            ("allocated_at", self.allocated_between),
            ("process_assigned_at", self.process_assigned_between),
            ("updated_at", self.updated_between),
        ] {
            if let Some((from, to)) = range {
                values.push(format_timestamp(from));
                values.push(format_timestamp(to));
                conditions.push(format!(
                    "{column} >= ?{} AND {column} < ?{}",
                    values.len() - 1,
                    values.len()
                ));
            }
        }

        let clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        (clause, values)
    }
}

/// Inserts a freshly dropped job and returns its row id.
///
/// A duplicate `job_id` surfaces as a constraint violation and inserts nothing.
pub fn insert(conn: &Connection, job: &Job) -> Result<i64, DatabaseError> {
    let (allocated_to, allocated_by, allocated_at, process_user, process_assigned_at) =
        match &job.assignment {
            Assignment::Unallocated => (None, None, None, None, None),
            Assignment::Writer {
                writer,
                allocated_by,
                allocated_at,
            } => (
                Some(writer.as_str()),
                Some(allocated_by.as_str()),
                Some(format_timestamp(*allocated_at)),
                None,
                None,
            ),
            Assignment::Process {
                process_user,
                assigned_by,
                assigned_at,
            } => (
                None,
                Some(assigned_by.as_str()),
                None,
                Some(process_user.as_str()),
                Some(format_timestamp(*assigned_at)),
            ),
        };

    conn.execute(
        "INSERT INTO jobs (job_id, instructions, attachment, created_by, topic, word_count,
         referencing_style, writing_style, completion_instructions, expected_deadline,
         strict_deadline, amount_cents, status, allocated_to, allocated_by, allocated_at,
         process_user, process_assigned_at, completed_form_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
         ?17, ?18, ?19, ?20, ?21)",
        params![
            job.job_id,
            job.instructions,
            job.attachment.as_ref().map(FileRef::as_str),
            job.created_by.as_str(),
            job.topic,
            job.word_count,
            job.referencing_style,
            job.writing_style,
            job.completion_instructions,
            job.expected_deadline.map(format_timestamp),
            job.strict_deadline.map(format_timestamp),
            job.amount.map(|a| a.cents()),
            job.status.as_str(),
            allocated_to,
            allocated_by,
            allocated_at,
            process_user,
            process_assigned_at,
            job.completed_form_at.map(format_timestamp),
            format_timestamp(job.created_at),
            format_timestamp(job.updated_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Finds a job by its stable identifier.
pub fn find_by_job_id(conn: &Connection, job_id: &str) -> Result<Option<Job>, DatabaseError> {
    conn.query_row(
        "SELECT * FROM jobs WHERE job_id = ?1",
        params![job_id],
        JobRow::from_row,
    )
    .optional()?
    .map(JobRow::into_job)
    .transpose()
}

/// Finds a job by its internal row id.
pub fn find_by_row_id(conn: &Connection, row_id: i64) -> Result<Option<Job>, DatabaseError> {
    conn.query_row(
        "SELECT * FROM jobs WHERE id = ?1",
        params![row_id],
        JobRow::from_row,
    )
    .optional()?
    .map(JobRow::into_job)
    .transpose()
}

/// Writes the completion details and moves the job to `pending_allocation`.
///
/// `strict_deadline` is only written when the column is still NULL.
pub fn complete(
    conn: &Connection,
    row_id: i64,
    expected: JobStatus,
    details: &CompletionDetails,
    strict_deadline: DateTime<Utc>,
    at: DateTime<Utc>,
) -> Result<usize, DatabaseError> {
    let at = format_timestamp(at);
    let changed = conn.execute(
        "UPDATE jobs SET topic = ?3, word_count = ?4, referencing_style = ?5,
         writing_style = ?6, completion_instructions = ?7, expected_deadline = ?8,
         strict_deadline = COALESCE(strict_deadline, ?9), amount_cents = ?10,
         status = 'pending_allocation', completed_form_at = ?11, updated_at = ?11
         WHERE id = ?1 AND status = ?2",
        params![
            row_id,
            expected.as_str(),
            details.topic,
            details.word_count,
            details.referencing_style,
            details.writing_style,
            details.completion_instructions,
            format_timestamp(details.expected_deadline),
            format_timestamp(strict_deadline),
            details.amount.cents(),
            at,
        ],
    )?;
    Ok(changed)
}

/// Routes a `pending_allocation` job to a writer.
pub fn assign_writer(
    conn: &Connection,
    row_id: i64,
    writer: &UserId,
    allocated_by: &UserId,
    at: DateTime<Utc>,
) -> Result<usize, DatabaseError> {
    let at = format_timestamp(at);
    let changed = conn.execute(
        "UPDATE jobs SET status = 'allocated', allocated_to = ?2, allocated_by = ?3,
         allocated_at = ?4, updated_at = ?4
         WHERE id = ?1 AND status = 'pending_allocation'
           AND allocated_to IS NULL AND process_user IS NULL",
        params![row_id, writer.as_str(), allocated_by.as_str(), at],
    )?;
    Ok(changed)
}

/// Routes a `pending_allocation` job to the process queue.
pub fn assign_process(
    conn: &Connection,
    row_id: i64,
    process_user: &UserId,
    assigned_by: &UserId,
    at: DateTime<Utc>,
) -> Result<usize, DatabaseError> {
    let at = format_timestamp(at);
    let changed = conn.execute(
        "UPDATE jobs SET status = 'processing_queue', process_user = ?2, allocated_by = ?3,
         process_assigned_at = ?4, updated_at = ?4
         WHERE id = ?1 AND status = 'pending_allocation'
           AND allocated_to IS NULL AND process_user IS NULL",
        params![row_id, process_user.as_str(), assigned_by.as_str(), at],
    )?;
    Ok(changed)
}

/// Moves a job from `from` to `to`, touching only status and updated_at.
pub fn transition(
    conn: &Connection,
    row_id: i64,
    from: JobStatus,
    to: JobStatus,
    at: DateTime<Utc>,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE jobs SET status = ?3, updated_at = ?4 WHERE id = ?1 AND status = ?2",
        params![row_id, from.as_str(), to.as_str(), format_timestamp(at)],
    )?;
    Ok(changed)
}

/// Replaces instructions and attachment while the job is still in `expected`.
pub fn update_content(
    conn: &Connection,
    row_id: i64,
    expected: JobStatus,
    instructions: &str,
    attachment: Option<&FileRef>,
    at: DateTime<Utc>,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE jobs SET instructions = ?3, attachment = ?4, updated_at = ?5
         WHERE id = ?1 AND status = ?2",
        params![
            row_id,
            expected.as_str(),
            instructions,
            attachment.map(FileRef::as_str),
            format_timestamp(at),
        ],
    )?;
    Ok(changed)
}

/// Queries jobs with filters.
pub fn query(conn: &Connection, filter: &JobFilter) -> Result<Vec<Job>, DatabaseError> {
    let (where_clause, values) = filter.where_clause();
    let mut sql = format!("SELECT * FROM jobs {} ORDER BY {}", where_clause, filter.order.sql());
    if filter.limit.is_some() || filter.offset.is_some() {
        // SQLite needs a LIMIT before OFFSET; -1 means unbounded.
        let limit = filter.limit.map(|l| l as i64).unwrap_or(-1);
        sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, filter.offset.unwrap_or(0)));
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows: Vec<JobRow> = stmt
        .query_map(rusqlite::params_from_iter(values.iter()), JobRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(JobRow::into_job).collect()
}

/// Counts jobs matching the filter. Ordering and pagination are ignored.
pub fn count(conn: &Connection, filter: &JobFilter) -> Result<u64, DatabaseError> {
    let (where_clause, values) = filter.where_clause();
    let sql = format!("SELECT COUNT(*) FROM jobs {}", where_clause);
    let total: u64 = conn.query_row(
        &sql,
        rusqlite::params_from_iter(values.iter()),
        |r| r.get(0),
    )?;
    Ok(total)
}

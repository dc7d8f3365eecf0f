//! The job entity and its status set.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::{not_blank, Amount, FileRef, UnknownVariant, UserId};

/// Lifecycle status of a job.
///
/// Writer branch: `PendingAllocation → Allocated → InProgress → Submitted → Completed`.
/// Process branch: `PendingAllocation → ProcessingQueue → Processing → Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Draft,
    PendingCompletion,
    PendingAllocation,
    Allocated,
    ProcessingQueue,
    Processing,
    InProgress,
    Submitted,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub const ALL: [JobStatus; 10] = [
        JobStatus::Draft,
        JobStatus::PendingCompletion,
        JobStatus::PendingAllocation,
        JobStatus::Allocated,
        JobStatus::ProcessingQueue,
        JobStatus::Processing,
        JobStatus::InProgress,
        JobStatus::Submitted,
        JobStatus::Completed,
        JobStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Draft => "draft",
            JobStatus::PendingCompletion => "pending_completion",
            JobStatus::PendingAllocation => "pending_allocation",
            JobStatus::Allocated => "allocated",
            JobStatus::ProcessingQueue => "processing_queue",
            JobStatus::Processing => "processing",
            JobStatus::InProgress => "in_progress",
            JobStatus::Submitted => "submitted",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Cancelled)
    }

    /// Statuses in which the creator may still edit instructions and attachment.
    pub fn is_editable(&self) -> bool {
        matches!(
            self,
            JobStatus::Draft | JobStatus::PendingCompletion | JobStatus::PendingAllocation
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JobStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("job status", s))
    }
}

/// Which allocation path a job is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssigneeKind {
    Writer,
    Process,
}

impl AssigneeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssigneeKind::Writer => "writer",
            AssigneeKind::Process => "process",
        }
    }
}

impl fmt::Display for AssigneeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssigneeKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "writer" => Ok(AssigneeKind::Writer),
            "process" => Ok(AssigneeKind::Process),
            other => Err(UnknownVariant::new("assignee kind", other)),
        }
    }
}

/// Where a job has been routed. The two paths cannot coexist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Assignment {
    Unallocated,
    Writer {
        writer: UserId,
        allocated_by: UserId,
        allocated_at: DateTime<Utc>,
    },
    Process {
        process_user: UserId,
        assigned_by: UserId,
        assigned_at: DateTime<Utc>,
    },
}

impl Assignment {
    pub fn kind(&self) -> Option<AssigneeKind> {
        match self {
            Assignment::Unallocated => None,
            Assignment::Writer { .. } => Some(AssigneeKind::Writer),
            Assignment::Process { .. } => Some(AssigneeKind::Process),
        }
    }

    pub fn assignee(&self) -> Option<&UserId> {
        match self {
            Assignment::Unallocated => None,
            Assignment::Writer { writer, .. } => Some(writer),
            Assignment::Process { process_user, .. } => Some(process_user),
        }
    }
}

/// A unit of work tracked from drop to completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Internal row id. Callers address jobs by `job_id`.
    pub row_id: i64,
    pub job_id: String,
    pub instructions: String,
    pub attachment: Option<FileRef>,
    pub created_by: UserId,
    pub topic: Option<String>,
    pub word_count: Option<u32>,
    pub referencing_style: Option<String>,
    pub writing_style: Option<String>,
    pub completion_instructions: Option<String>,
    pub expected_deadline: Option<DateTime<Utc>>,
    pub strict_deadline: Option<DateTime<Utc>>,
    pub amount: Option<Amount>,
    pub status: JobStatus,
    pub assignment: Assignment,
    pub completed_form_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn writer(&self) -> Option<&UserId> {
        match &self.assignment {
            Assignment::Writer { writer, .. } => Some(writer),
            _ => None,
        }
    }

    pub fn process_user(&self) -> Option<&UserId> {
        match &self.assignment {
            Assignment::Process { process_user, .. } => Some(process_user),
            _ => None,
        }
    }
}

/// Input for the job drop step.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    #[validate(
        custom(function = "not_blank"),
        length(max = 100, message = "must be at most 100 characters")
    )]
    pub job_id: String,
    #[validate(custom(function = "not_blank"))]
    pub instructions: String,
    #[serde(default)]
    pub attachment: Option<FileRef>,
    /// Save as `draft` instead of `pending_completion`.
    #[serde(default)]
    pub draft: bool,
}

/// Input for the completion step.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompletionDetails {
    #[serde(default)]
    pub topic: Option<String>,
    /// Stored as `u32`.
    #[validate(range(
        min = 1,
        max = 4294967295i64,
        message = "must be between 1 and 4294967295"
    ))]
    pub word_count: i64,
    #[serde(default)]
    pub referencing_style: Option<String>,
    #[serde(default)]
    pub writing_style: Option<String>,
    #[serde(default)]
    pub completion_instructions: Option<String>,
    pub expected_deadline: DateTime<Utc>,
    #[validate(custom(function = "positive_amount"))]
    pub amount: Amount,
}

fn positive_amount(amount: &Amount) -> Result<(), ValidationError> {
    if amount.is_positive() {
        return Ok(());
    }
    Err(ValidationError::new("range").with_message("must be greater than 0".into()))
}

//! Writer deliverable record paired with a writer-allocated job.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{FileRef, UnknownVariant, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Assigned,
    InProgress,
    Submitted,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Assigned => "assigned",
            SubmissionStatus::InProgress => "in_progress",
            SubmissionStatus::Submitted => "submitted",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "assigned" => Ok(SubmissionStatus::Assigned),
            "in_progress" => Ok(SubmissionStatus::InProgress),
            "submitted" => Ok(SubmissionStatus::Submitted),
            other => Err(UnknownVariant::new("submission status", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriterSubmission {
    pub id: i64,
    pub job_row_id: i64,
    pub writer: UserId,
    pub structure_file: Option<FileRef>,
    pub final_copy: Option<FileRef>,
    pub associate_file: Option<FileRef>,
    pub final_summary: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub status: SubmissionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Deliverables handed in with the final submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalUpload {
    pub final_copy: Option<FileRef>,
    #[serde(default)]
    pub associate_file: Option<FileRef>,
    #[serde(default)]
    pub final_summary: Option<String>,
}

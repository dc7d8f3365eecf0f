//! Domain types shared by the store, the workflow engine and dashboards.

pub mod amount;
pub mod file_ref;
pub mod job;
pub mod submission;
pub mod user;

pub use amount::Amount;
pub use file_ref::FileRef;
pub use job::{Assignment, AssigneeKind, CompletionDetails, Job, JobStatus, NewJob};
pub use submission::{FinalUpload, SubmissionStatus, WriterSubmission};
pub use user::{ApprovalStatus, NewUser, Role, User, UserId};

use std::borrow::Cow;

use thiserror::Error;
use validator::ValidationError;

/// A string did not name any variant of a closed set (role, status, ...).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Rejects text that is empty once surrounding whitespace is removed.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message(Cow::Borrowed("must not be empty")));
    }
    Ok(())
}

use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::db::DatabaseError;
use crate::model::{JobStatus, Role, UserId};

#[derive(Error, Debug)]
pub enum JobflowError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("A global subscriber is already installed")]
    AlreadyInstalled,
}

/// Failure of a workflow operation. Every variant leaves stored state untouched.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("{actor} may not {action} (role: {role})")]
    Unauthorized {
        actor: UserId,
        action: &'static str,
        role: Role,
    },

    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("{entity} '{id}' cannot {action} from status '{from}'")]
    IllegalTransition {
        entity: &'static str,
        id: String,
        from: String,
        action: &'static str,
    },

    #[error("User '{user_id}' cannot be assigned: {reason}")]
    InvalidAssignee { user_id: UserId, reason: String },

    #[error("{kind} '{value}' already exists")]
    DuplicateIdentifier { kind: &'static str, value: String },

    #[error("Invalid {field}: {message}")]
    ValidationFailed {
        field: Cow<'static, str>,
        message: String,
    },

    #[error("Job '{job_id}' can no longer be edited (status: {status})")]
    ImmutableState { job_id: String, status: JobStatus },

    #[error("Storage failure: {0}")]
    Storage(#[from] DatabaseError),
}

/// Reports the first failing field, in field-name order.
impl From<ValidationErrors> for WorkflowError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));
        let Some((field, errs)) = fields.into_iter().next() else {
            return WorkflowError::validation("input", errors.to_string());
        };
        let message = errs
            .first()
            .map(|e| match &e.message {
                Some(message) => message.to_string(),
                None => e.code.to_string(),
            })
            .unwrap_or_else(|| "is invalid".to_string());
        WorkflowError::ValidationFailed {
            field: Cow::Owned(field.to_string()),
            message,
        }
    }
}

impl From<rusqlite::Error> for WorkflowError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Storage(DatabaseError::from(e))
    }
}

/// Discriminant of [`WorkflowError`], for callers that map failures to responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unauthorized,
    NotFound,
    IllegalTransition,
    InvalidAssignee,
    DuplicateIdentifier,
    ValidationFailed,
    ImmutableState,
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::NotFound => "not_found",
            ErrorKind::IllegalTransition => "illegal_transition",
            ErrorKind::InvalidAssignee => "invalid_assignee",
            ErrorKind::DuplicateIdentifier => "duplicate_identifier",
            ErrorKind::ValidationFailed => "validation_failed",
            ErrorKind::ImmutableState => "immutable_state",
            ErrorKind::Storage => "storage",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::Unauthorized { .. } => ErrorKind::Unauthorized,
            WorkflowError::NotFound { .. } => ErrorKind::NotFound,
            WorkflowError::IllegalTransition { .. } => ErrorKind::IllegalTransition,
            WorkflowError::InvalidAssignee { .. } => ErrorKind::InvalidAssignee,
            WorkflowError::DuplicateIdentifier { .. } => ErrorKind::DuplicateIdentifier,
            WorkflowError::ValidationFailed { .. } => ErrorKind::ValidationFailed,
            WorkflowError::ImmutableState { .. } => ErrorKind::ImmutableState,
            WorkflowError::Storage(_) => ErrorKind::Storage,
        }
    }

    pub(crate) fn job_not_found(job_id: &str) -> Self {
        WorkflowError::NotFound {
            kind: "Job",
            id: job_id.to_string(),
        }
    }

    pub(crate) fn illegal_job_transition(
        job_id: &str,
        from: JobStatus,
        action: &'static str,
    ) -> Self {
        WorkflowError::IllegalTransition {
            entity: "Job",
            id: job_id.to_string(),
            from: from.to_string(),
            action,
        }
    }

    pub(crate) fn user_not_found(id: &UserId) -> Self {
        WorkflowError::NotFound {
            kind: "User",
            id: id.to_string(),
        }
    }

    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        WorkflowError::ValidationFailed {
            field: Cow::Borrowed(field),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, JobflowError>;

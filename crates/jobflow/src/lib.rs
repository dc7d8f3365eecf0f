pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod sanitize;
pub mod workflow;

pub use config::{load_config, load_config_from_str, Config, LoggingConfig};
pub use dashboard::{
    AdminDashboard, AllocatorDashboard, MarketingDashboard, ProcessDashboard, WriterDashboard,
};
pub use db::{Database, DatabaseError};
pub use error::{ConfigError, ErrorKind, JobflowError, LoggingError, Result, WorkflowError};
pub use model::{
    Amount, ApprovalStatus, AssigneeKind, Assignment, CompletionDetails, FileRef, FinalUpload, Job,
    JobStatus, NewJob, NewUser, Role, SubmissionStatus, User, UserId, WriterSubmission,
};
pub use workflow::{
    AllocationTarget, Clock, DeadlinePolicy, FixedClock, JobEdit, SystemClock, Workflow,
    WriterProgress, WriterQueue,
};

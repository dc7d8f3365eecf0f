//! The job transition table.
//!
//! Every status change a workflow operation makes is looked up here first;
//! anything the table does not list is an illegal transition.

use crate::error::WorkflowError;
use crate::model::{Job, JobStatus};

/// An operation that moves a job between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobAction {
    Complete,
    AllocateWriter,
    AllocateProcess,
    Start,
    Submit,
    StartProcessing,
    FinishProcessing,
    Accept,
    Cancel,
}

impl JobAction {
    pub const ALL: [JobAction; 9] = [
        JobAction::Complete,
        JobAction::AllocateWriter,
        JobAction::AllocateProcess,
        JobAction::Start,
        JobAction::Submit,
        JobAction::StartProcessing,
        JobAction::FinishProcessing,
        JobAction::Accept,
        JobAction::Cancel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobAction::Complete => "complete",
            JobAction::AllocateWriter => "allocate to a writer",
            JobAction::AllocateProcess => "route to the process queue",
            JobAction::Start => "start",
            JobAction::Submit => "submit",
            JobAction::StartProcessing => "start processing",
            JobAction::FinishProcessing => "finish processing",
            JobAction::Accept => "accept",
            JobAction::Cancel => "cancel",
        }
    }

    /// Status reached by applying this action in `from`, if legal.
    pub fn target(&self, from: JobStatus) -> Option<JobStatus> {
        use JobStatus::*;

        match (self, from) {
            (JobAction::Complete, Draft | PendingCompletion) => Some(PendingAllocation),
            (JobAction::AllocateWriter, PendingAllocation) => Some(Allocated),
            (JobAction::AllocateProcess, PendingAllocation) => Some(ProcessingQueue),
            (JobAction::Start, Allocated) => Some(InProgress),
            (JobAction::Submit, InProgress) => Some(Submitted),
            (JobAction::StartProcessing, ProcessingQueue) => Some(Processing),
            (JobAction::FinishProcessing, Processing) => Some(Completed),
            (JobAction::Accept, Submitted) => Some(Completed),
            (JobAction::Cancel, s) if !s.is_terminal() => Some(Cancelled),
            _ => None,
        }
    }
}

/// Resolves the next status for `job` or fails with `IllegalTransition`.
pub fn next_status(job: &Job, action: JobAction) -> Result<JobStatus, WorkflowError> {
    action.target(job.status).ok_or_else(|| {
        WorkflowError::illegal_job_transition(&job.job_id, job.status, action.as_str())
    })
}

/// Whether any action moves a job directly from `from` to `to`.
pub fn can_transition(from: JobStatus, to: JobStatus) -> bool {
    JobAction::ALL
        .iter()
        .any(|action| action.target(from) == Some(to))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_branch_is_linear() {
        use JobStatus::*;
        let path = [
            PendingCompletion,
            PendingAllocation,
            Allocated,
            InProgress,
            Submitted,
            Completed,
        ];
        for pair in path.windows(2) {
            assert!(can_transition(pair[0], pair[1]), "{:?}", pair);
        }
        assert!(!can_transition(Allocated, Submitted));
        assert!(!can_transition(InProgress, Allocated));
    }

    #[test]
    fn test_process_branch() {
        use JobStatus::*;
        assert!(can_transition(PendingAllocation, ProcessingQueue));
        assert!(can_transition(ProcessingQueue, Processing));
        assert!(can_transition(Processing, Completed));
        assert!(!can_transition(ProcessingQueue, InProgress));
    }

    #[test]
    fn test_allocation_requires_pending_allocation() {
        for status in JobStatus::ALL {
            let expected = status == JobStatus::PendingAllocation;
            assert_eq!(
                JobAction::AllocateWriter.target(status).is_some(),
                expected,
                "{status}"
            );
            assert_eq!(JobAction::AllocateProcess.target(status).is_some(), expected);
        }
    }

    #[test]
    fn test_cancel_from_any_non_terminal() {
        for status in JobStatus::ALL {
            let target = JobAction::Cancel.target(status);
            if status.is_terminal() {
                assert_eq!(target, None);
            } else {
                assert_eq!(target, Some(JobStatus::Cancelled));
            }
        }
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for to in JobStatus::ALL {
            assert!(!can_transition(JobStatus::Completed, to));
            assert!(!can_transition(JobStatus::Cancelled, to));
        }
    }
}

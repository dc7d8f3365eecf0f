//! Routing a `pending_allocation` job to exactly one assignee.

use serde::{Deserialize, Serialize};

use crate::error::WorkflowError;
use crate::model::{ApprovalStatus, AssigneeKind, Role, User, UserId};

use super::lifecycle::JobAction;

/// Where a job is being sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "assignee", rename_all = "snake_case")]
pub enum AllocationTarget {
    Writer(UserId),
    Process(UserId),
}

impl AllocationTarget {
    pub fn new(kind: AssigneeKind, assignee: UserId) -> Self {
        match kind {
            AssigneeKind::Writer => AllocationTarget::Writer(assignee),
            AssigneeKind::Process => AllocationTarget::Process(assignee),
        }
    }

    /// Picks a target from an allocation form. A writer takes precedence
    /// over a process user when both are supplied.
    pub fn resolve(writer: Option<UserId>, process_user: Option<UserId>) -> Option<Self> {
        writer
            .map(AllocationTarget::Writer)
            .or_else(|| process_user.map(AllocationTarget::Process))
    }

    pub fn kind(&self) -> AssigneeKind {
        match self {
            AllocationTarget::Writer(_) => AssigneeKind::Writer,
            AllocationTarget::Process(_) => AssigneeKind::Process,
        }
    }

    pub fn assignee(&self) -> &UserId {
        match self {
            AllocationTarget::Writer(id) | AllocationTarget::Process(id) => id,
        }
    }

    pub(crate) fn action(&self) -> JobAction {
        match self {
            AllocationTarget::Writer(_) => JobAction::AllocateWriter,
            AllocationTarget::Process(_) => JobAction::AllocateProcess,
        }
    }
}

/// Checks that `user` may receive work on the given path.
pub fn validate_assignee(
    target: &AllocationTarget,
    user: Option<&User>,
) -> Result<(), WorkflowError> {
    let id = target.assignee();
    let invalid = |reason: String| WorkflowError::InvalidAssignee {
        user_id: id.clone(),
        reason,
    };

    let user = user.ok_or_else(|| invalid("no such user".to_string()))?;

    let required = Role::for_assignee(target.kind());
    if user.role != required {
        return Err(invalid(format!(
            "role is {}, expected {}",
            user.role, required
        )));
    }
    if user.approval_status != ApprovalStatus::Approved {
        return Err(invalid(format!(
            "approval status is {}",
            user.approval_status
        )));
    }
    if !user.is_active {
        return Err(invalid("account is inactive".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::Utc;

    fn user(role: Role, approval_status: ApprovalStatus, is_active: bool) -> User {
        User {
            id: UserId::from("u-1"),
            email: "u1@example.com".to_string(),
            first_name: "Uma".to_string(),
            last_name: "One".to_string(),
            whatsapp_no: "100".to_string(),
            role,
            approval_status,
            is_active,
            approved_by: None,
            approved_at: None,
            rejection_reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_writer_wins_over_process() {
        let target = AllocationTarget::resolve(Some("w".into()), Some("p".into()));
        assert_eq!(target, Some(AllocationTarget::Writer("w".into())));

        let target = AllocationTarget::resolve(None, Some("p".into()));
        assert_eq!(target, Some(AllocationTarget::Process("p".into())));

        assert_eq!(AllocationTarget::resolve(None, None), None);
    }

    #[test]
    fn test_valid_writer_accepted() {
        let target = AllocationTarget::Writer("u-1".into());
        let u = user(Role::Writer, ApprovalStatus::Approved, true);
        assert!(validate_assignee(&target, Some(&u)).is_ok());
    }

    #[test]
    fn test_rejections() {
        let target = AllocationTarget::Writer("u-1".into());
        let cases = [
            user(Role::Process, ApprovalStatus::Approved, true),
            user(Role::Writer, ApprovalStatus::Pending, false),
            user(Role::Writer, ApprovalStatus::Rejected, false),
            user(Role::Writer, ApprovalStatus::Approved, false),
        ];
        for u in &cases {
            let err = validate_assignee(&target, Some(u)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidAssignee);
        }
        let err = validate_assignee(&target, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidAssignee);
    }

    #[test]
    fn test_process_target_requires_process_role() {
        let target = AllocationTarget::new(AssigneeKind::Process, "u-1".into());
        let writer = user(Role::Writer, ApprovalStatus::Approved, true);
        assert!(validate_assignee(&target, Some(&writer)).is_err());
        let process = user(Role::Process, ApprovalStatus::Approved, true);
        assert!(validate_assignee(&target, Some(&process)).is_ok());
    }
}

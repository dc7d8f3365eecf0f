use tracing::{info, info_span};
use validator::Validate;

use crate::db::user_repo::{self, UserFilter};
use crate::db::DatabaseError;
use crate::error::WorkflowError;
use crate::model::{ApprovalStatus, AssigneeKind, NewUser, Role, User, UserId};
use crate::sanitize::redact_email;

use super::{load_user, require_role, unauthorized, Workflow};

fn duplicate_email(e: DatabaseError, email: &str) -> WorkflowError {
    if e.is_constraint_violation() {
        WorkflowError::DuplicateIdentifier {
            kind: "Email",
            value: email.to_string(),
        }
    } else {
        e.into()
    }
}

fn user_transition_refused(user: &User, action: &'static str) -> WorkflowError {
    WorkflowError::IllegalTransition {
        entity: "User",
        id: user.id.to_string(),
        from: user.approval_status.to_string(),
        action,
    }
}

impl Workflow {
    /// Registers a new account. It stays pending and inactive until approved.
    pub fn register_user(&self, new_user: NewUser) -> Result<User, WorkflowError> {
        let _span = info_span!("register_user", email = %redact_email(&new_user.email)).entered();
        new_user.validate()?;
        if new_user.role == Role::Superadmin {
            return Err(WorkflowError::validation(
                "role",
                "superadmin accounts cannot self-register",
            ));
        }
        self.insert_user(new_user, ApprovalStatus::Pending)
    }

    /// Creates an approved, active superadmin. Used to seed a fresh installation.
    pub fn bootstrap_superadmin(&self, new_user: NewUser) -> Result<User, WorkflowError> {
        let _span =
            info_span!("bootstrap_superadmin", email = %redact_email(&new_user.email)).entered();
        new_user.validate()?;
        self.insert_user(
            NewUser {
                role: Role::Superadmin,
                ..new_user
            },
            ApprovalStatus::Approved,
        )
    }

    fn insert_user(
        &self,
        new_user: NewUser,
        approval_status: ApprovalStatus,
    ) -> Result<User, WorkflowError> {
        let now = self.now();
        let email = new_user.email.trim().to_string();
        let user = User {
            id: UserId::new(),
            email: email.clone(),
            first_name: new_user.first_name.trim().to_string(),
            last_name: new_user.last_name.trim().to_string(),
            whatsapp_no: new_user.whatsapp_no.trim().to_string(),
            role: new_user.role,
            approval_status,
            is_active: approval_status == ApprovalStatus::Approved,
            approved_by: None,
            approved_at: (approval_status == ApprovalStatus::Approved).then_some(now),
            rejection_reason: None,
            created_at: now,
            updated_at: now,
        };

        self.db.with_tx(|tx| {
            user_repo::insert(tx, &user).map_err(|e| duplicate_email(e, &email))?;
            Ok::<_, WorkflowError>(())
        })?;

        info!(
            user_id = %user.id,
            role = %user.role,
            status = %user.approval_status,
            "user registered"
        );
        Ok(user)
    }

    /// Approves a pending user and assigns their working role.
    pub fn approve_user(
        &self,
        actor: &UserId,
        user_id: &UserId,
        role: Role,
    ) -> Result<User, WorkflowError> {
        let _span = info_span!("approve_user", user_id = %user_id, actor = %actor).entered();
        let now = self.now();

        self.db.with_tx(|tx| {
            let admin = require_role(tx, actor, "approve users", |r| r.can_manage_users())?;
            let target = load_user(tx, user_id)?;

            let changed = user_repo::approve(tx, user_id, role, &admin.id, now)?;
            if changed == 0 {
                return Err(user_transition_refused(&target, "approve"));
            }

            info!(role = %role, "user approved");
            load_user(tx, user_id)
        })
    }

    /// Rejects a pending user. The account is deactivated.
    pub fn reject_user(
        &self,
        actor: &UserId,
        user_id: &UserId,
        reason: Option<String>,
    ) -> Result<User, WorkflowError> {
        let _span = info_span!("reject_user", user_id = %user_id, actor = %actor).entered();
        let now = self.now();
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        self.db.with_tx(|tx| {
            let admin = require_role(tx, actor, "reject users", |r| r.can_manage_users())?;
            let target = load_user(tx, user_id)?;

            let changed = user_repo::reject(tx, user_id, reason.as_deref(), &admin.id, now)?;
            if changed == 0 {
                return Err(user_transition_refused(&target, "reject"));
            }

            info!("user rejected");
            load_user(tx, user_id)
        })
    }

    /// Changes another user's role. Approval state is unchanged.
    pub fn change_user_role(
        &self,
        actor: &UserId,
        user_id: &UserId,
        role: Role,
    ) -> Result<User, WorkflowError> {
        let _span = info_span!("change_user_role", user_id = %user_id, actor = %actor).entered();
        let now = self.now();

        self.db.with_tx(|tx| {
            let admin = require_role(tx, actor, "change roles", |r| r.can_manage_users())?;
            if &admin.id == user_id {
                return Err(unauthorized(&admin, "change their own role"));
            }
            let target = load_user(tx, user_id)?;

            user_repo::update_role(tx, user_id, role, now)?;

            info!(from = %target.role, to = %role, "user role changed");
            load_user(tx, user_id)
        })
    }

    /// Deletes a user that is still pending or was rejected.
    pub fn delete_user(&self, actor: &UserId, user_id: &UserId) -> Result<(), WorkflowError> {
        let _span = info_span!("delete_user", user_id = %user_id, actor = %actor).entered();

        self.db.with_tx(|tx| {
            let admin = require_role(tx, actor, "delete users", |r| r.can_manage_users())?;
            if &admin.id == user_id {
                return Err(unauthorized(&admin, "delete their own account"));
            }
            let target = load_user(tx, user_id)?;

            let changed = user_repo::delete_unapproved(tx, user_id)?;
            if changed == 0 {
                return Err(user_transition_refused(&target, "be deleted"));
            }

            info!(email = %redact_email(&target.email), "user deleted");
            Ok(())
        })
    }

    /// Approved, active users that can receive work on the given path, by name.
    pub fn eligible_assignees(&self, kind: AssigneeKind) -> Result<Vec<User>, WorkflowError> {
        let users = self.db.with_conn(|conn| {
            user_repo::list(conn, &UserFilter::eligible(Role::for_assignee(kind)))
        })?;
        Ok(users)
    }
}

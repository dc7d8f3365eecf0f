//! Users, roles and approval state.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::job::AssigneeKind;
use super::{not_blank, UnknownVariant};

/// Opaque user identifier (UUID v4 string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Marketing,
    Allocator,
    Writer,
    Process,
    Manager,
    Admin,
    Superadmin,
    AccountsTeam,
}

impl Role {
    pub const ALL: [Role; 9] = [
        Role::User,
        Role::Marketing,
        Role::Allocator,
        Role::Writer,
        Role::Process,
        Role::Manager,
        Role::Admin,
        Role::Superadmin,
        Role::AccountsTeam,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Marketing => "marketing",
            Role::Allocator => "allocator",
            Role::Writer => "writer",
            Role::Process => "process",
            Role::Manager => "manager",
            Role::Admin => "admin",
            Role::Superadmin => "superadmin",
            Role::AccountsTeam => "accounts_team",
        }
    }

    /// Roles allowed to route jobs and review submissions.
    pub fn can_allocate(&self) -> bool {
        matches!(self, Role::Allocator | Role::Admin | Role::Manager)
    }

    pub fn can_cancel_jobs(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }

    /// Roles allowed to approve, reject, re-role and delete users.
    pub fn can_manage_users(&self) -> bool {
        matches!(self, Role::Admin | Role::Superadmin)
    }

    /// The role an assignee must hold for the given allocation path.
    pub fn for_assignee(kind: AssigneeKind) -> Role {
        match kind {
            AssigneeKind::Writer => Role::Writer,
            AssigneeKind::Process => Role::Process,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("role", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApprovalStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            "rejected" => Ok(ApprovalStatus::Rejected),
            other => Err(UnknownVariant::new("approval status", other)),
        }
    }
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub whatsapp_no: String,
    pub role: Role,
    pub approval_status: ApprovalStatus,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Only approved, active users may take part in role-gated operations.
    pub fn can_act(&self) -> bool {
        self.approval_status == ApprovalStatus::Approved && self.is_active
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Registration input.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[validate(email(message = "is not a valid address"))]
    pub email: String,
    #[validate(custom(function = "not_blank"))]
    pub first_name: String,
    #[validate(custom(function = "not_blank"))]
    pub last_name: String,
    pub whatsapp_no: String,
    #[serde(default = "default_role")]
    pub role: Role,
}

fn default_role() -> Role {
    Role::User
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_roundtrip_through_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("janitor".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_permissions() {
        assert!(Role::Allocator.can_allocate());
        assert!(Role::Manager.can_allocate());
        assert!(!Role::Writer.can_allocate());
        assert!(!Role::Allocator.can_cancel_jobs());
        assert!(Role::Superadmin.can_manage_users());
        assert!(!Role::Manager.can_manage_users());
    }

    #[test]
    fn test_role_serde_uses_snake_case() {
        let json = serde_json::to_string(&Role::AccountsTeam).unwrap();
        assert_eq!(json, "\"accounts_team\"");
    }

    #[test]
    fn test_approval_status_parse() {
        assert_eq!(
            "approved".parse::<ApprovalStatus>().unwrap(),
            ApprovalStatus::Approved
        );
        let err = "maybe".parse::<ApprovalStatus>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown approval status 'maybe'");
    }
}

//! User repository: persistence for the `users` table.
//!
//! Functions take a `&Connection` so they compose inside
//! [`Database::with_tx`](super::Database::with_tx).

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::time::{format_timestamp, parse_optional_timestamp, parse_timestamp};
use super::{parse_column, DatabaseError};
use crate::model::{ApprovalStatus, Role, User, UserId};

const TABLE: &str = "users";

/// A raw user row from the database.
#[derive(Debug, Clone)]
struct UserRow {
    id: String,
    email: String,
    first_name: String,
    last_name: String,
    whatsapp_no: String,
    role: String,
    approval_status: String,
    is_active: bool,
    approved_by: Option<String>,
    approved_at: Option<String>,
    rejection_reason: Option<String>,
    created_at: String,
    updated_at: String,
}

impl UserRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            email: row.get("email")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            whatsapp_no: row.get("whatsapp_no")?,
            role: row.get("role")?,
            approval_status: row.get("approval_status")?,
            is_active: row.get("is_active")?,
            approved_by: row.get("approved_by")?,
            approved_at: row.get("approved_at")?,
            rejection_reason: row.get("rejection_reason")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    fn into_user(self) -> Result<User, DatabaseError> {
        Ok(User {
            id: UserId::from(self.id),
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            whatsapp_no: self.whatsapp_no,
            role: parse_column(TABLE, "role", &self.role)?,
            approval_status: parse_column(TABLE, "approval_status", &self.approval_status)?,
            is_active: self.is_active,
            approved_by: self.approved_by.map(UserId::from),
            approved_at: parse_optional_timestamp(TABLE, "approved_at", self.approved_at.as_deref())?,
            rejection_reason: self.rejection_reason,
            created_at: parse_timestamp(TABLE, "created_at", &self.created_at)?,
            updated_at: parse_timestamp(TABLE, "updated_at", &self.updated_at)?,
        })
    }
}

/// Sort order for user listings.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum UserOrder {
    /// Most recently registered first.
    #[default]
    NewestFirst,
    /// Alphabetical by first name, then last name.
    Name,
}

/// Query filter parameters for user listing.
#[derive(Debug, Default, Clone)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub approval_status: Option<ApprovalStatus>,
    /// Only users with `is_active = 1`.
    pub active_only: bool,
    pub order: UserOrder,
}

impl UserFilter {
    /// Approved, active users holding `role`.
    pub fn eligible(role: Role) -> Self {
        Self {
            role: Some(role),
            approval_status: Some(ApprovalStatus::Approved),
            active_only: true,
            order: UserOrder::Name,
        }
    }

    fn where_clause(&self) -> (String, Vec<String>) {
        let mut conditions = Vec::new();
        let mut values = Vec::new();

        if let Some(role) = self.role {
            values.push(role.as_str().to_string());
            conditions.push(format!("role = ?{}", values.len()));
        }
        if let Some(status) = self.approval_status {
            values.push(status.as_str().to_string());
            conditions.push(format!("approval_status = ?{}", values.len()));
        }
        if self.active_only {
            conditions.push("is_active = 1".to_string());
        }

        let clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        (clause, values)
    }
}

/// Inserts a new user row. A duplicate email surfaces as a constraint violation.
pub fn insert(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, email, first_name, last_name, whatsapp_no, role,
         approval_status, is_active, approved_by, approved_at, rejection_reason,
         created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            user.id.as_str(),
            user.email,
            user.first_name,
            user.last_name,
            user.whatsapp_no,
            user.role.as_str(),
            user.approval_status.as_str(),
            user.is_active,
            user.approved_by.as_ref().map(UserId::as_str),
            user.approved_at.map(format_timestamp),
            user.rejection_reason,
            format_timestamp(user.created_at),
            format_timestamp(user.updated_at),
        ],
    )?;
    Ok(())
}

/// Finds a user by id.
pub fn find_by_id(conn: &Connection, id: &UserId) -> Result<Option<User>, DatabaseError> {
    conn.query_row(
        "SELECT * FROM users WHERE id = ?1",
        params![id.as_str()],
        UserRow::from_row,
    )
    .optional()?
    .map(UserRow::into_user)
    .transpose()
}

/// Finds a user by email (case-insensitive).
pub fn find_by_email(conn: &Connection, email: &str) -> Result<Option<User>, DatabaseError> {
    conn.query_row(
        "SELECT * FROM users WHERE email = ?1",
        params![email],
        UserRow::from_row,
    )
    .optional()?
    .map(UserRow::into_user)
    .transpose()
}

/// Moves a `pending` user to `approved` with the given role.
///
/// Returns the number of rows changed: 0 when the user is missing or no
/// longer pending.
pub fn approve(
    conn: &Connection,
    id: &UserId,
    role: Role,
    approved_by: &UserId,
    at: DateTime<Utc>,
) -> Result<usize, DatabaseError> {
    let at = format_timestamp(at);
    let changed = conn.execute(
        "UPDATE users SET approval_status = 'approved', is_active = 1, role = ?2,
         approved_by = ?3, approved_at = ?4, rejection_reason = NULL, updated_at = ?4
         WHERE id = ?1 AND approval_status = 'pending'",
        params![id.as_str(), role.as_str(), approved_by.as_str(), at],
    )?;
    Ok(changed)
}

/// Moves a `pending` user to `rejected` and deactivates them.
pub fn reject(
    conn: &Connection,
    id: &UserId,
    reason: Option<&str>,
    rejected_by: &UserId,
    at: DateTime<Utc>,
) -> Result<usize, DatabaseError> {
    let at = format_timestamp(at);
    let changed = conn.execute(
        "UPDATE users SET approval_status = 'rejected', is_active = 0,
         rejection_reason = ?2, approved_by = ?3, approved_at = ?4, updated_at = ?4
         WHERE id = ?1 AND approval_status = 'pending'",
        params![id.as_str(), reason, rejected_by.as_str(), at],
    )?;
    Ok(changed)
}

/// Changes a user's role. Approval state is left untouched.
pub fn update_role(
    conn: &Connection,
    id: &UserId,
    role: Role,
    at: DateTime<Utc>,
) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE users SET role = ?2, updated_at = ?3 WHERE id = ?1",
        params![id.as_str(), role.as_str(), format_timestamp(at)],
    )?;
    Ok(changed)
}

/// Deletes a user that was never approved. Approved users are kept.
pub fn delete_unapproved(conn: &Connection, id: &UserId) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "DELETE FROM users WHERE id = ?1 AND approval_status IN ('pending', 'rejected')",
        params![id.as_str()],
    )?;
    Ok(changed)
}

/// Lists users matching the filter.
pub fn list(conn: &Connection, filter: &UserFilter) -> Result<Vec<User>, DatabaseError> {
    let (where_clause, values) = filter.where_clause();
    let order = match filter.order {
        UserOrder::NewestFirst => "created_at DESC",
        UserOrder::Name => "first_name ASC, last_name ASC",
    };
    let sql = format!("SELECT * FROM users {} ORDER BY {}", where_clause, order);

    let mut stmt = conn.prepare(&sql)?;
    let rows: Vec<UserRow> = stmt
        .query_map(rusqlite::params_from_iter(values.iter()), UserRow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter().map(UserRow::into_user).collect()
}

/// Counts users matching the filter.
pub fn count(conn: &Connection, filter: &UserFilter) -> Result<u64, DatabaseError> {
    let (where_clause, values) = filter.where_clause();
    let sql = format!("SELECT COUNT(*) FROM users {}", where_clause);
    let total: u64 = conn.query_row(
        &sql,
        rusqlite::params_from_iter(values.iter()),
        |r| r.get(0),
    )?;
    Ok(total)
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::permissions::{Permission, PermissionSet, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Active,
    Alumni,
    Deactive,
    Pending,
    Banned,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "ACTIVE",
            UserStatus::Alumni => "ALUMNI",
            UserStatus::Deactive => "DEACTIVE",
            UserStatus::Pending => "PENDING",
            UserStatus::Banned => "BANNED",
        }
    }

    pub fn parse(s: &str) -> Option<UserStatus> {
        match s {
            "ACTIVE" => Some(UserStatus::Active),
            "ALUMNI" => Some(UserStatus::Alumni),
            "DEACTIVE" => Some(UserStatus::Deactive),
            "PENDING" => Some(UserStatus::Pending),
            "BANNED" => Some(UserStatus::Banned),
            _ => None,
        }
    }
}

/// Internal user struct — includes the password digest and lockout state.
/// Never serialized to clients; response shapes are built per handler.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    /// Stable external identifier (opaque hex), unique.
    pub user_id: String,
    pub student_code: Option<String>,
    pub email: String,
    pub name: String,
    /// Stored role name. Kept as text so legacy values still load; the
    /// permission table treats unmapped names as view-only.
    pub role: String,
    pub status: UserStatus,
    /// Derived from `role` on every role mutation, never set directly.
    pub permissions: PermissionSet,
    pub password: String,
    pub is_verified: bool,
    pub failed_login_attempts: i64,
    pub lock_until: Option<DateTime<Utc>>,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions.has(permission)
    }
}

/// New user data for creation. `password` is the argon2 digest — hashing
/// happens in the account-security layer before this struct is built.
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: Role,
    pub student_code: Option<String>,
}

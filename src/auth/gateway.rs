//! Authorization gateway: who may act.
//!
//! Every mutating call into the meeting registry goes through here first.
//! The registry re-validates entity-level invariants (editable state, status
//! graph) on its own; the two layers answer different questions.

use actix_session::Session;
use chrono::{DateTime, Utc};
use rusqlite::Connection;

use crate::auth::lockout;
use crate::auth::permissions::Permission;
use crate::auth::session::require_user_id;
use crate::errors::AppError;
use crate::models::user::{self, User, UserStatus};

/// Check a loaded user against a required permission.
///
/// Deny order: locked account, inactive account, missing permission. The
/// reason enum is all a caller learns; nothing else about the permission
/// structure leaks.
pub fn authorize(user: &User, permission: Permission, now: DateTime<Utc>) -> Result<(), AppError> {
    if lockout::is_locked(user, now) {
        return Err(AppError::AccountLocked {
            retry_after_secs: lockout::retry_after_secs(user, now),
        });
    }
    if user.status != UserStatus::Active {
        return Err(AppError::AccountNotActive);
    }
    if !user.permissions.has(permission) {
        return Err(AppError::PermissionDenied(permission.as_str().to_string()));
    }
    Ok(())
}

/// Resolve the session user and authorize them for `permission`.
///
/// The user row is loaded fresh on every call — status or role may have
/// changed since the session was issued.
pub fn require_actor(
    conn: &Connection,
    session: &Session,
    permission: Permission,
    now: DateTime<Utc>,
) -> Result<User, AppError> {
    let user_id = require_user_id(session)?;
    let user = user::find_by_id(conn, user_id)?.ok_or(AppError::Unauthorized)?;
    authorize(&user, permission, now)?;
    Ok(user)
}

/// Resolve the session user without a permission check (e.g. for the status
/// endpoint, which any authenticated account may call on itself).
pub fn require_session_user(conn: &Connection, session: &Session) -> Result<User, AppError> {
    let user_id = require_user_id(session)?;
    user::find_by_id(conn, user_id)?.ok_or(AppError::Unauthorized)
}

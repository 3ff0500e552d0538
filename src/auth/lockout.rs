//! Account security: password changes, failed-attempt tracking, lockout.
//!
//! Lockout state lives on the user row (`failed_login_attempts`, `lock_until`)
//! so it survives restarts and applies across nodes, unlike an in-process
//! per-IP limiter.

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;

use crate::auth::password;
use crate::config::LockoutPolicy;
use crate::errors::AppError;
use crate::models::user::{self, User};

/// True iff the account is currently locked out.
pub fn is_locked(user: &User, now: DateTime<Utc>) -> bool {
    matches!(user.lock_until, Some(until) if now < until)
}

/// Seconds until the lock elapses. Zero when not locked.
pub fn retry_after_secs(user: &User, now: DateTime<Utc>) -> i64 {
    match user.lock_until {
        Some(until) if now < until => (until - now).num_seconds().max(1),
        _ => 0,
    }
}

/// Record a failed login. When the attempt count reaches the policy
/// threshold, the account is locked until `now + lockout_duration`.
pub fn record_failed_attempt(
    conn: &Connection,
    user_id: i64,
    policy: &LockoutPolicy,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    let attempts = user::increment_failed_attempts(conn, user_id)?;
    if attempts >= policy.max_attempts as i64 {
        let until = now + Duration::seconds(policy.lockout_duration.as_secs() as i64);
        user::set_lock_until(conn, user_id, until)?;
        log::warn!("Account {user_id} locked after {attempts} failed attempts");
    }
    Ok(())
}

/// Record a successful login: reset the attempt counter and clear any lock.
pub fn record_success(conn: &Connection, user_id: i64) -> Result<(), AppError> {
    user::clear_lockout(conn, user_id)?;
    Ok(())
}

/// Store a new password digest for the account. The only path that writes
/// the password column — callers must invoke it exactly when the secret
/// actually changed, never on unrelated saves.
pub fn set_password(conn: &Connection, user_id: i64, plaintext: &str) -> Result<(), AppError> {
    let hash = password::hash_password(plaintext).map_err(AppError::Hash)?;
    user::update_password(conn, user_id, &hash)?;
    Ok(())
}

/// Check a plaintext against the account's stored digest. Verification
/// faults deny rather than propagate.
pub fn verify_user_password(user: &User, plaintext: &str) -> bool {
    password::verify_password(plaintext, &user.password)
}

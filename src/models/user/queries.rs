use rand::Rng;
use rusqlite::{Connection, params};

use super::types::{NewUser, User, UserStatus};
use crate::auth::permissions::{PermissionSet, Role};
use crate::auth::validate::normalize_email;
use crate::db;
use crate::errors::AppError;

const SELECT_USER: &str = "\
    SELECT id, user_id, student_code, email, name, role, status, permissions, \
           password, is_verified, failed_login_attempts, lock_until, \
           created_at, updated_at \
    FROM users";

fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<User> {
    let status_raw: String = row.get("status")?;
    let permissions_csv: String = row.get("permissions")?;
    let lock_until: Option<String> = row.get("lock_until")?;
    Ok(User {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        student_code: row.get("student_code")?,
        email: row.get("email")?,
        name: row.get("name")?,
        role: row.get("role")?,
        // Unknown status denies (treated as deactivated) rather than grants.
        status: UserStatus::parse(&status_raw).unwrap_or(UserStatus::Deactive),
        permissions: PermissionSet::from_csv(&permissions_csv),
        password: row.get("password")?,
        is_verified: row.get("is_verified")?,
        failed_login_attempts: row.get("failed_login_attempts")?,
        lock_until: lock_until.as_deref().and_then(db::parse_utc),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn find_one(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> rusqlite::Result<Option<User>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query_map(params, row_to_user)?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

pub fn find_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<User>> {
    find_one(conn, &format!("{SELECT_USER} WHERE id = ?1"), params![id])
}

pub fn find_by_email(conn: &Connection, email: &str) -> rusqlite::Result<Option<User>> {
    find_one(
        conn,
        &format!("{SELECT_USER} WHERE email = ?1"),
        params![normalize_email(email)],
    )
}

/// Lookup by the stable external identifier.
pub fn find_by_user_id(conn: &Connection, user_id: &str) -> rusqlite::Result<Option<User>> {
    find_one(
        conn,
        &format!("{SELECT_USER} WHERE user_id = ?1"),
        params![user_id],
    )
}

/// Opaque external identifier, generated when the caller does not supply one.
fn generate_user_id() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 12] = rng.random();
    hex::encode(bytes)
}

/// Create a user. New accounts start PENDING; the permission set is derived
/// from the role here so the row never exists with a stale set.
pub fn create(conn: &Connection, new: &NewUser) -> Result<i64, AppError> {
    let permissions = PermissionSet::from_role(new.role.as_str()).to_csv();
    let result = conn.execute(
        "INSERT INTO users (user_id, student_code, email, name, role, status, permissions, password) \
         VALUES (?1, ?2, ?3, ?4, ?5, 'PENDING', ?6, ?7)",
        params![
            generate_user_id(),
            new.student_code,
            normalize_email(&new.email),
            new.name,
            new.role.as_str(),
            permissions,
            new.password,
        ],
    );
    match result {
        Ok(_) => Ok(conn.last_insert_rowid()),
        Err(e) if db::is_unique_violation(&e) => Err(AppError::Validation(
            "Email, user id, or student code already registered".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

/// Change a user's role. The stored permission set is recomputed in the same
/// statement — role and permissions never drift apart.
pub fn update_role(conn: &Connection, id: i64, role: Role) -> Result<(), AppError> {
    let permissions = PermissionSet::from_role(role.as_str()).to_csv();
    let changed = conn.execute(
        "UPDATE users SET role = ?1, permissions = ?2, \
         updated_at = strftime('%Y-%m-%dT%H:%M:%SZ','now') WHERE id = ?3",
        params![role.as_str(), permissions, id],
    )?;
    if changed == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

pub fn update_status(conn: &Connection, id: i64, status: UserStatus) -> Result<(), AppError> {
    let changed = conn.execute(
        "UPDATE users SET status = ?1, \
         updated_at = strftime('%Y-%m-%dT%H:%M:%SZ','now') WHERE id = ?2",
        params![status.as_str(), id],
    )?;
    if changed == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

/// Update only the password digest. Callers hash first; see
/// `auth::lockout::set_password`.
pub fn update_password(conn: &Connection, id: i64, password_hash: &str) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE users SET password = ?1, \
         updated_at = strftime('%Y-%m-%dT%H:%M:%SZ','now') WHERE id = ?2",
        params![password_hash, id],
    )?;
    Ok(())
}

/// Bump the failed-attempt counter and return the new count.
pub fn increment_failed_attempts(conn: &Connection, id: i64) -> rusqlite::Result<i64> {
    conn.execute(
        "UPDATE users SET failed_login_attempts = failed_login_attempts + 1 WHERE id = ?1",
        params![id],
    )?;
    conn.query_row(
        "SELECT failed_login_attempts FROM users WHERE id = ?1",
        params![id],
        |row| row.get(0),
    )
}

pub fn set_lock_until(
    conn: &Connection,
    id: i64,
    until: chrono::DateTime<chrono::Utc>,
) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE users SET lock_until = ?1 WHERE id = ?2",
        params![db::fmt_utc(until), id],
    )?;
    Ok(())
}

pub fn clear_lockout(conn: &Connection, id: i64) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE users SET failed_login_attempts = 0, lock_until = NULL WHERE id = ?1",
        params![id],
    )?;
    Ok(())
}

pub fn count(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
}

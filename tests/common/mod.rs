//! Shared test infrastructure for model layer tests.
//!
//! Provides a temporary SQLite database with migrations applied, plus
//! fixtures for users in various roles and states.

use rusqlite::Connection;
use tempfile::TempDir;

use huddle::auth::password;
use huddle::auth::permissions::Role;
use huddle::db::MIGRATIONS;
use huddle::models::user::{self, NewUser, User, UserStatus};

pub const TEST_PASSWORD: &str = "password123";

/// Setup a test database with schema applied.
///
/// Returns a tuple of (TempDir, Connection) where TempDir must be kept
/// alive for the Connection to remain valid.
pub fn setup_test_db() -> (TempDir, Connection) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("test.db");
    let conn = Connection::open(&db_path).expect("Failed to open test DB");

    conn.execute_batch("PRAGMA foreign_keys=ON; PRAGMA journal_mode=WAL;")
        .expect("Failed to set pragmas");

    conn.execute_batch(MIGRATIONS)
        .expect("Failed to run migrations");

    (dir, conn)
}

/// Create an ACTIVE user with the given role and `TEST_PASSWORD`.
pub fn create_active_user(conn: &Connection, email: &str, role: Role) -> User {
    let hash = password::hash_password(TEST_PASSWORD).expect("Failed to hash password");
    let id = user::create(
        conn,
        &NewUser {
            email: email.to_string(),
            name: format!("{} user", role.as_str()),
            password: hash,
            role,
            student_code: None,
        },
    )
    .expect("Failed to create user");
    user::update_status(conn, id, UserStatus::Active).expect("Failed to activate user");
    user::find_by_id(conn, id)
        .expect("Query failed")
        .expect("User not found")
}

/// Create a user left in the default PENDING status.
#[allow(dead_code)]
pub fn create_pending_user(conn: &Connection, email: &str, role: Role) -> User {
    let hash = password::hash_password(TEST_PASSWORD).expect("Failed to hash password");
    let id = user::create(
        conn,
        &NewUser {
            email: email.to_string(),
            name: "Pending user".to_string(),
            password: hash,
            role,
            student_code: None,
        },
    )
    .expect("Failed to create user");
    user::find_by_id(conn, id)
        .expect("Query failed")
        .expect("User not found")
}

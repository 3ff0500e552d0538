use chrono::{DateTime, Utc};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::auth::{password, permissions::Role};
use crate::models::user::{self, NewUser};

pub type DbPool = Pool<SqliteConnectionManager>;

pub const MIGRATIONS: &str = include_str!("schema.sql");

pub fn init_pool(database_url: &str) -> DbPool {
    let manager = SqliteConnectionManager::file(database_url).with_init(|conn| {
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Ok(())
    });
    Pool::builder()
        .max_size(8)
        .build(manager)
        .expect("Failed to create DB pool")
}

pub fn run_migrations(pool: &DbPool) {
    let conn = pool.get().expect("Failed to get DB connection for migrations");
    conn.execute_batch(MIGRATIONS)
        .expect("Failed to run migrations");
    log::info!("Database migrations complete");
}

/// Bootstrap an admin account if the users table is empty, so a fresh
/// deployment has a way in. Idempotent.
pub fn seed_admin(pool: &DbPool, email: &str, plaintext: &str) {
    let conn = pool.get().expect("Failed to get DB connection for seeding");

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
        .unwrap_or(0);
    if count > 0 {
        log::info!("Database already seeded ({count} users), skipping admin seed");
        return;
    }

    let hash = match password::hash_password(plaintext) {
        Ok(h) => h,
        Err(e) => {
            log::error!("Admin seed: failed to hash password: {e}");
            return;
        }
    };

    let new = NewUser {
        email: email.to_string(),
        name: "Administrator".to_string(),
        password: hash,
        role: Role::Admin,
        student_code: None,
    };
    match user::create(&conn, &new) {
        Ok(id) => {
            // The seeded admin must be able to act immediately.
            if let Err(e) = user::update_status(&conn, id, user::UserStatus::Active) {
                log::error!("Admin seed: failed to activate account: {e}");
            }
            log::info!("Seeded admin account {email}");
        }
        Err(e) => log::error!("Admin seed failed: {e}"),
    }
}

/// Instants are stored as UTC RFC 3339 text so lexical comparison matches
/// chronological order. Every write path must go through this formatter.
pub fn fmt_utc(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

pub fn parse_utc(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Distinguish UNIQUE-constraint failures from other database errors, so
/// racing creates on the same key surface as a validation problem rather
/// than an internal fault.
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        }
        _ => false,
    }
}

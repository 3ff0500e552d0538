//! Account security tests — password hashing/verification and lockout.

mod common;

use chrono::{Duration, Utc};
use common::*;
use huddle::auth::permissions::Role;
use huddle::auth::{lockout, password};
use huddle::config::LockoutPolicy;
use huddle::models::user;

#[test]
fn test_hash_password_success() {
    let hash = password::hash_password(TEST_PASSWORD).expect("Failed to hash password");

    assert!(!hash.is_empty());
    assert!(hash.len() > 20); // Argon2 hashes are long
}

#[test]
fn test_verify_password_round_trip() {
    let hash = password::hash_password(TEST_PASSWORD).expect("Failed to hash password");

    assert!(password::verify_password(TEST_PASSWORD, &hash));
    assert!(!password::verify_password("wrongpassword", &hash));
}

#[test]
fn test_verify_malformed_digest_degrades_to_false() {
    // A verification fault must read as "deny", never as an error.
    assert!(!password::verify_password(TEST_PASSWORD, "not-a-digest"));
    assert!(!password::verify_password(TEST_PASSWORD, ""));
}

#[test]
fn test_hash_password_randomness() {
    let hash1 = password::hash_password(TEST_PASSWORD).expect("Failed to hash first password");
    let hash2 = password::hash_password(TEST_PASSWORD).expect("Failed to hash second password");

    // Same password should produce different hashes (different salts)
    assert_ne!(hash1, hash2);
}

#[test]
fn test_set_password_changes_digest() {
    let (_dir, conn) = setup_test_db();
    let u = create_active_user(&conn, "pw@example.com", Role::Student);

    lockout::set_password(&conn, u.id, "new-secret-99").expect("Failed to set password");

    let updated = user::find_by_id(&conn, u.id).unwrap().unwrap();
    assert!(lockout::verify_user_password(&updated, "new-secret-99"));
    assert!(!lockout::verify_user_password(&updated, TEST_PASSWORD));
}

#[test]
fn test_lockout_after_max_attempts() {
    let (_dir, conn) = setup_test_db();
    let u = create_active_user(&conn, "locked@example.com", Role::Student);
    let policy = LockoutPolicy::default();
    let now = Utc::now();

    for _ in 0..policy.max_attempts {
        lockout::record_failed_attempt(&conn, u.id, &policy, now).expect("record failed");
    }

    let locked = user::find_by_id(&conn, u.id).unwrap().unwrap();
    assert_eq!(locked.failed_login_attempts, policy.max_attempts as i64);
    assert!(lockout::is_locked(&locked, now));
    assert!(lockout::retry_after_secs(&locked, now) > 0);

    // The lock elapses on its own.
    let later = now + Duration::from_std(policy.lockout_duration).unwrap() + Duration::seconds(1);
    assert!(!lockout::is_locked(&locked, later));
    assert_eq!(lockout::retry_after_secs(&locked, later), 0);
}

#[test]
fn test_attempts_below_threshold_do_not_lock() {
    let (_dir, conn) = setup_test_db();
    let u = create_active_user(&conn, "almost@example.com", Role::Student);
    let policy = LockoutPolicy::default();
    let now = Utc::now();

    for _ in 0..policy.max_attempts - 1 {
        lockout::record_failed_attempt(&conn, u.id, &policy, now).expect("record failed");
    }

    let loaded = user::find_by_id(&conn, u.id).unwrap().unwrap();
    assert_eq!(loaded.failed_login_attempts, (policy.max_attempts - 1) as i64);
    assert!(!lockout::is_locked(&loaded, now));
    assert!(loaded.lock_until.is_none());
}

#[test]
fn test_record_success_resets_lockout() {
    let (_dir, conn) = setup_test_db();
    let u = create_active_user(&conn, "reset@example.com", Role::Student);
    let policy = LockoutPolicy::default();
    let now = Utc::now();

    for _ in 0..policy.max_attempts {
        lockout::record_failed_attempt(&conn, u.id, &policy, now).expect("record failed");
    }
    lockout::record_success(&conn, u.id).expect("record success");

    let loaded = user::find_by_id(&conn, u.id).unwrap().unwrap();
    assert_eq!(loaded.failed_login_attempts, 0);
    assert!(loaded.lock_until.is_none());
    assert!(!lockout::is_locked(&loaded, now));
}

#[test]
fn test_new_user_starts_pending() {
    let (_dir, conn) = setup_test_db();
    let u = create_pending_user(&conn, "fresh@example.com", Role::Student);

    assert_eq!(u.status, user::UserStatus::Pending);
    assert_eq!(u.failed_login_attempts, 0);
    assert!(u.lock_until.is_none());
    assert!(!u.user_id.is_empty());
}

#[test]
fn test_duplicate_email_rejected() {
    let (_dir, conn) = setup_test_db();
    create_active_user(&conn, "dup@example.com", Role::Student);

    let hash = password::hash_password(TEST_PASSWORD).unwrap();
    let result = user::create(
        &conn,
        &user::NewUser {
            email: "dup@example.com".to_string(),
            name: "Second".to_string(),
            password: hash,
            role: Role::Student,
            student_code: None,
        },
    );
    assert!(matches!(
        result,
        Err(huddle::errors::AppError::Validation(_))
    ));
    assert_eq!(user::count(&conn).unwrap(), 1);
}

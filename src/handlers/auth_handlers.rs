use actix_session::Session;
use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::Deserialize;

use crate::auth::{lockout, session, validate};
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::user;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/v1/auth/login
///
/// Unknown email and wrong password produce the same 401 body; a caller
/// learns nothing about which half failed. A locked account answers 423
/// before any password work.
pub async fn login(
    pool: web::Data<DbPool>,
    config: web::Data<AppConfig>,
    session: Session,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let conn = pool.get()?;
    let now = Utc::now();

    let found = user::find_by_email(&conn, &validate::normalize_email(&body.email))?;
    let Some(u) = found else {
        return Err(AppError::Unauthorized);
    };

    if lockout::is_locked(&u, now) {
        return Err(AppError::AccountLocked {
            retry_after_secs: lockout::retry_after_secs(&u, now),
        });
    }

    if !lockout::verify_user_password(&u, &body.password) {
        lockout::record_failed_attempt(&conn, u.id, &config.lockout, now)?;
        return Err(AppError::Unauthorized);
    }

    lockout::record_success(&conn, u.id)?;
    session::log_in(&session, &u);

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "user_id": u.user_id,
        "name": u.name,
        "role": u.role,
        "status": u.status,
    })))
}

/// POST /api/v1/auth/logout
pub async fn logout(session: Session) -> Result<HttpResponse, AppError> {
    session.purge();
    Ok(HttpResponse::NoContent().finish())
}

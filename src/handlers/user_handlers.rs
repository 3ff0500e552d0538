use actix_session::Session;
use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::Deserialize;

use crate::auth::gateway;
use crate::auth::permissions::{Permission, Role};
use crate::auth::{lockout, password, validate};
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::user::{self, NewUser};

/// GET /api/v1/users/status — name, email, status, and role of the session
/// user. Served uncached so a just-banned account can't present a stale
/// ACTIVE answer.
pub async fn status(pool: web::Data<DbPool>, session: Session) -> Result<HttpResponse, AppError> {
    let conn = pool.get()?;
    let u = gateway::require_session_user(&conn, &session)?;

    Ok(HttpResponse::Ok()
        .insert_header(("Cache-Control", "no-store, no-cache, must-revalidate"))
        .json(serde_json::json!({
            "name": u.name,
            "email": u.email,
            "status": u.status,
            "role": u.role,
        })))
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: Option<Role>,
    pub student_code: Option<String>,
}

/// POST /api/v1/users — create an account (MANAGE_USERS).
pub async fn create(
    pool: web::Data<DbPool>,
    session: Session,
    body: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let conn = pool.get()?;
    gateway::require_actor(&conn, &session, Permission::ManageUsers, Utc::now())?;

    let mut errors = Vec::new();
    errors.extend(validate::validate_email(&body.email));
    errors.extend(validate::validate_password(&body.password));
    errors.extend(validate::validate_required(&body.name, "Name", 100));
    if !errors.is_empty() {
        return Err(AppError::Validation(errors.join("; ")));
    }

    let hashed = password::hash_password(&body.password).map_err(AppError::Hash)?;
    let new = NewUser {
        email: body.email.clone(),
        name: body.name.trim().to_string(),
        password: hashed,
        role: body.role.unwrap_or(Role::Student),
        student_code: body.student_code.clone(),
    };
    let id = user::create(&conn, &new)?;
    let created = user::find_by_id(&conn, id)?.ok_or(AppError::NotFound)?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "user_id": created.user_id,
        "email": created.email,
        "name": created.name,
        "role": created.role,
        "status": created.status,
    })))
}

#[derive(Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

/// PUT /api/v1/users/{id}/role — change a role (MANAGE_USERS). The stored
/// permission set is recomputed as part of the same update.
pub async fn update_role(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<String>,
    body: web::Json<UpdateRoleRequest>,
) -> Result<HttpResponse, AppError> {
    let conn = pool.get()?;
    gateway::require_actor(&conn, &session, Permission::ManageUsers, Utc::now())?;

    let target = user::find_by_user_id(&conn, &path.into_inner())?.ok_or(AppError::NotFound)?;
    user::update_role(&conn, target.id, body.role)?;
    let updated = user::find_by_id(&conn, target.id)?.ok_or(AppError::NotFound)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "user_id": updated.user_id,
        "role": updated.role,
        "permissions": updated.permissions.0,
    })))
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// POST /api/v1/users/password — change the session user's own password.
/// The digest is recomputed only here, where the secret actually changed.
pub async fn change_password(
    pool: web::Data<DbPool>,
    session: Session,
    body: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse, AppError> {
    let conn = pool.get()?;
    let u = gateway::require_session_user(&conn, &session)?;

    if !lockout::verify_user_password(&u, &body.current_password) {
        return Err(AppError::Unauthorized);
    }
    if let Some(msg) = validate::validate_password(&body.new_password) {
        return Err(AppError::Validation(msg));
    }
    lockout::set_password(&conn, u.id, &body.new_password)?;

    Ok(HttpResponse::NoContent().finish())
}

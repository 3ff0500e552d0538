use actix_web::{HttpResponse, ResponseError};
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Db(rusqlite::Error),
    Pool(r2d2::Error),
    Hash(String),
    Session(String),
    Validation(String),
    PermissionDenied(String),
    AccountLocked { retry_after_secs: i64 },
    AccountNotActive,
    InvalidTransition { from: String, to: String },
    NotEditable(String),
    ExternalScheduling(String),
    Unauthorized,
    NotFound,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Db(e) => write!(f, "Database error: {e}"),
            AppError::Pool(e) => write!(f, "Pool error: {e}"),
            AppError::Hash(e) => write!(f, "Hash error: {e}"),
            AppError::Session(e) => write!(f, "Session error: {e}"),
            AppError::Validation(e) => write!(f, "{e}"),
            AppError::PermissionDenied(code) => write!(f, "Missing permission: {code}"),
            AppError::AccountLocked { retry_after_secs } => {
                write!(f, "Account locked, retry in {retry_after_secs}s")
            }
            AppError::AccountNotActive => write!(f, "Account is not active"),
            AppError::InvalidTransition { from, to } => {
                write!(f, "Invalid status transition: {from} -> {to}")
            }
            AppError::NotEditable(status) => {
                write!(f, "Meeting is {status} and can no longer be edited")
            }
            AppError::ExternalScheduling(e) => write!(f, "External scheduling failed: {e}"),
            AppError::Unauthorized => write!(f, "Invalid credentials"),
            AppError::NotFound => write!(f, "Not found"),
        }
    }
}

fn json_error(message: &str) -> serde_json::Value {
    serde_json::json!({ "error": message })
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Validation(msg) => HttpResponse::BadRequest().json(json_error(msg)),
            AppError::Unauthorized | AppError::Session(_) => {
                HttpResponse::Unauthorized().json(json_error("Authentication required"))
            }
            AppError::PermissionDenied(_) => {
                HttpResponse::Forbidden().json(json_error("Permission denied"))
            }
            AppError::AccountNotActive => {
                HttpResponse::Forbidden().json(json_error("Account is not active"))
            }
            AppError::NotFound => HttpResponse::NotFound().json(json_error("Not found")),
            AppError::InvalidTransition { from, to } => HttpResponse::Conflict().json(
                json_error(&format!("Invalid status transition: {from} -> {to}")),
            ),
            AppError::NotEditable(status) => HttpResponse::Conflict().json(json_error(
                &format!("Meeting is {status} and can no longer be edited"),
            )),
            AppError::AccountLocked { retry_after_secs } => HttpResponse::build(
                actix_web::http::StatusCode::LOCKED,
            )
            .insert_header(("Retry-After", retry_after_secs.to_string()))
            .json(serde_json::json!({
                "error": "Account locked",
                "retry_after_secs": retry_after_secs,
            })),
            AppError::ExternalScheduling(_) => {
                log::error!("{self}");
                HttpResponse::BadGateway().json(json_error("Failed to schedule meeting"))
            }
            // Internal faults: log the detail, return a generic body.
            AppError::Db(_) | AppError::Pool(_) | AppError::Hash(_) => {
                log::error!("{self}");
                HttpResponse::InternalServerError().json(json_error("Internal server error"))
            }
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(e: rusqlite::Error) -> Self {
        AppError::Db(e)
    }
}

impl From<r2d2::Error> for AppError {
    fn from(e: r2d2::Error) -> Self {
        AppError::Pool(e)
    }
}

use actix_session::Session;

use crate::errors::AppError;
use crate::models::user::User;

pub fn get_user_id(session: &Session) -> Option<i64> {
    session.get::<i64>("user_id").unwrap_or(None)
}

pub fn require_user_id(session: &Session) -> Result<i64, AppError> {
    get_user_id(session).ok_or(AppError::Unauthorized)
}

/// Establish a logged-in session. Only the database id goes into the cookie;
/// role, status, and permissions are re-read from the store on every request
/// so that revocations take effect immediately.
pub fn log_in(session: &Session, user: &User) {
    session.renew();
    let _ = session.insert("user_id", user.id);
}

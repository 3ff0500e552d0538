use actix_session::Session;
use actix_web::{HttpResponse, web};
use chrono::{Duration, Utc};
use serde::Deserialize;

use crate::auth::gateway;
use crate::auth::permissions::Permission;
use crate::calendar::HttpCalendarProvider;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::models::meeting::{self, MeetingStatus, NewParticipant};
use crate::scheduling::{self, MeetingRequest};

/// POST /api/v1/meetings — schedule a meeting through the coordinator.
/// Authorization (CREATE_MEETING) happens inside the coordinator, before
/// the calendar call.
pub async fn create(
    pool: web::Data<DbPool>,
    calendar: web::Data<HttpCalendarProvider>,
    session: Session,
    body: web::Json<MeetingRequest>,
) -> Result<HttpResponse, AppError> {
    let conn = pool.get()?;
    let actor = gateway::require_session_user(&conn, &session)?;

    let scheduled =
        scheduling::schedule_meeting(&conn, calendar.get_ref(), &actor, &body, Utc::now()).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "meeting": scheduled.meeting,
        "participants": scheduled.participants,
        "external_event_id": scheduled.external_event_id,
    })))
}

/// GET /api/v1/meetings — meetings the session user created or participates
/// in (VIEW_MEETING).
pub async fn list(pool: web::Data<DbPool>, session: Session) -> Result<HttpResponse, AppError> {
    let conn = pool.get()?;
    let actor = gateway::require_actor(&conn, &session, Permission::ViewMeeting, Utc::now())?;

    let meetings = meeting::find_for_user(&conn, actor.id)?;
    Ok(HttpResponse::Ok().json(meetings))
}

#[derive(Deserialize)]
pub struct UpcomingQuery {
    pub lookahead_mins: Option<i64>,
}

/// GET /api/v1/meetings/upcoming?lookahead_mins=N (VIEW_MEETING).
pub async fn upcoming(
    pool: web::Data<DbPool>,
    session: Session,
    query: web::Query<UpcomingQuery>,
) -> Result<HttpResponse, AppError> {
    let conn = pool.get()?;
    gateway::require_actor(&conn, &session, Permission::ViewMeeting, Utc::now())?;

    let lookahead_mins = query.lookahead_mins.unwrap_or(60).clamp(0, 60 * 24 * 7);
    let meetings = meeting::find_upcoming(&conn, Utc::now(), Duration::minutes(lookahead_mins))?;
    Ok(HttpResponse::Ok().json(meetings))
}

/// POST /api/v1/meetings/{id}/participants — append participants
/// (EDIT_MEETING). The registry rejects non-SCHEDULED meetings on its own.
pub async fn add_participants(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<i64>,
    body: web::Json<Vec<NewParticipant>>,
) -> Result<HttpResponse, AppError> {
    let conn = pool.get()?;
    gateway::require_actor(&conn, &session, Permission::EditMeeting, Utc::now())?;

    let participants = meeting::add_participants(&conn, path.into_inner(), &body)?;
    Ok(HttpResponse::Ok().json(participants))
}

#[derive(Deserialize)]
pub struct TransitionRequest {
    pub status: MeetingStatus,
}

/// POST /api/v1/meetings/{id}/status — advance the meeting along its
/// lifecycle (EDIT_MEETING). Off-graph targets come back as a 409.
pub async fn transition(
    pool: web::Data<DbPool>,
    session: Session,
    path: web::Path<i64>,
    body: web::Json<TransitionRequest>,
) -> Result<HttpResponse, AppError> {
    let conn = pool.get()?;
    gateway::require_actor(&conn, &session, Permission::EditMeeting, Utc::now())?;

    let updated = meeting::transition(&conn, path.into_inner(), body.status)?;
    Ok(HttpResponse::Ok().json(updated))
}

//! Scheduling coordinator.
//!
//! Orchestrates meeting creation: authorize the actor, obtain a join link
//! from the calendar service, then commit through the meeting registry. The
//! external call completes before anything is written — a meeting row with
//! no usable link must never exist, so a provider fault (including timeout
//! or cancellation) aborts the whole operation with nothing persisted.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Deserialize;

use crate::auth::gateway;
use crate::auth::permissions::Permission;
use crate::auth::validate::{normalize_email, validate_required};
use crate::calendar::{CalendarProvider, CreateEventRequest};
use crate::errors::AppError;
use crate::models::meeting::{self, Meeting, NewMeeting, NewParticipant, Participant, Platform};
use crate::models::user::User;

#[derive(Debug, Clone, Deserialize)]
pub struct MeetingRequest {
    pub title: String,
    pub description: Option<String>,
    pub platform: Platform,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub participants: Vec<NewParticipant>,
    /// Optional reminder fire times.
    #[serde(default)]
    pub reminders: Vec<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct ScheduledMeeting {
    pub meeting: Meeting,
    pub participants: Vec<Participant>,
    /// Echo of the calendar system's reference for the caller.
    pub external_event_id: String,
}

/// Request shape and participant emails are checked up front, before the
/// external call, so nothing can fail validation after the meeting row is
/// committed.
fn validate_request(req: &MeetingRequest) -> Result<Vec<String>, AppError> {
    if let Some(msg) = validate_required(&req.title, "Title", 200) {
        return Err(AppError::Validation(msg));
    }
    let mut attendees = Vec::with_capacity(req.participants.len());
    for participant in &req.participants {
        if participant.email.trim().is_empty() {
            return Err(AppError::Validation(
                "Participant email is required".to_string(),
            ));
        }
        attendees.push(normalize_email(&participant.email));
    }
    Ok(attendees)
}

pub async fn schedule_meeting<C: CalendarProvider>(
    conn: &Connection,
    calendar: &C,
    actor: &User,
    req: &MeetingRequest,
    now: DateTime<Utc>,
) -> Result<ScheduledMeeting, AppError> {
    gateway::authorize(actor, Permission::CreateMeeting, now)?;

    let attendees = validate_request(req)?;

    let event = calendar
        .create_event(&CreateEventRequest {
            summary: req.title.trim().to_string(),
            description: req.description.clone().unwrap_or_default(),
            start_date_time: req.start,
            end_date_time: req.end,
            attendees,
            time_zone: "UTC".to_string(),
        })
        .await
        .map_err(|e| {
            log::error!("Calendar event creation failed: {e}");
            AppError::ExternalScheduling(e.to_string())
        })?;

    let duration = (req.end - req.start).num_minutes();
    if duration <= 0 {
        return Err(AppError::Validation(
            "Meeting end must be after its start".to_string(),
        ));
    }

    let meeting = meeting::create(
        conn,
        &NewMeeting {
            title: req.title.clone(),
            description: req.description.clone(),
            platform: req.platform,
            meeting_link: event.join_link.clone(),
            date: req.start,
            duration,
            created_by: actor.id,
            external_event_id: Some(event.external_event_id.clone()),
        },
    )?;

    let participants = meeting::add_participants(conn, meeting.id, &req.participants)?;
    for fire_at in &req.reminders {
        meeting::add_reminder(conn, meeting.id, *fire_at)?;
    }

    log::info!(
        "Scheduled meeting {} ({} min) for user {}",
        meeting.id,
        duration,
        actor.id
    );

    Ok(ScheduledMeeting {
        meeting,
        participants,
        external_event_id: event.external_event_id,
    })
}

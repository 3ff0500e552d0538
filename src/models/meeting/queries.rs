//! Meeting registry: creation, participant and reminder mutation, status
//! transitions, due-reminder queries.
//!
//! Entity invariants are enforced here regardless of what callers already
//! checked: the link is present and unique before any insert, mutations
//! require an editable meeting, and status only moves along the lifecycle
//! graph.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{Connection, params};

use super::types::*;
use crate::db;
use crate::errors::AppError;

const SELECT_MEETING: &str = "\
    SELECT id, title, description, platform, meeting_link, date, duration, \
           status, created_by, external_event_id, created_at, updated_at \
    FROM meetings";

fn parse_instant(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    db::parse_utc(raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            format!("invalid timestamp: {raw}").into(),
        )
    })
}

fn row_to_meeting(row: &rusqlite::Row) -> rusqlite::Result<Meeting> {
    let platform_raw: String = row.get("platform")?;
    let status_raw: String = row.get("status")?;
    let date_raw: String = row.get("date")?;
    Ok(Meeting {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        platform: Platform::parse(&platform_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                format!("unknown platform: {platform_raw}").into(),
            )
        })?,
        meeting_link: row.get("meeting_link")?,
        date: parse_instant(&date_raw)?,
        duration: row.get("duration")?,
        status: MeetingStatus::parse(&status_raw).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                format!("unknown status: {status_raw}").into(),
            )
        })?,
        created_by: row.get("created_by")?,
        external_event_id: row.get("external_event_id")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn row_to_participant(row: &rusqlite::Row) -> rusqlite::Result<Participant> {
    let joined_at: Option<String> = row.get("joined_at")?;
    Ok(Participant {
        id: row.get("id")?,
        meeting_id: row.get("meeting_id")?,
        user_id: row.get("user_id")?,
        email: row.get("email")?,
        role: row.get("role")?,
        joined_at: joined_at.as_deref().and_then(db::parse_utc),
    })
}

pub fn find_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<Meeting>> {
    let sql = format!("{SELECT_MEETING} WHERE id = ?1");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query_map(params![id], row_to_meeting)?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

/// Create a meeting. Produces a SCHEDULED meeting or a validation error;
/// a row without a link, a positive duration, or a known platform can never
/// be persisted.
pub fn create(conn: &Connection, new: &NewMeeting) -> Result<Meeting, AppError> {
    if new.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    if new.meeting_link.trim().is_empty() {
        return Err(AppError::Validation("Meeting link is required".to_string()));
    }
    if new.duration <= 0 {
        return Err(AppError::Validation(
            "Duration must be a positive number of minutes".to_string(),
        ));
    }

    let result = conn.execute(
        "INSERT INTO meetings (title, description, platform, meeting_link, date, duration, \
         status, created_by, external_event_id) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'SCHEDULED', ?7, ?8)",
        params![
            new.title.trim(),
            new.description,
            new.platform.as_str(),
            new.meeting_link,
            db::fmt_utc(new.date),
            new.duration,
            new.created_by,
            new.external_event_id,
        ],
    );
    match result {
        Ok(_) => {}
        Err(e) if db::is_unique_violation(&e) => {
            return Err(AppError::Validation(
                "Meeting link is already in use".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    }

    let id = conn.last_insert_rowid();
    find_by_id(conn, id)?.ok_or(AppError::NotFound)
}

/// Meetings the user created or participates in, newest first.
pub fn find_for_user(conn: &Connection, user_id: i64) -> rusqlite::Result<Vec<Meeting>> {
    let sql = format!(
        "{SELECT_MEETING} m \
         WHERE m.created_by = ?1 \
            OR EXISTS (SELECT 1 FROM meeting_participants p \
                       WHERE p.meeting_id = m.id AND p.user_id = ?1) \
         ORDER BY m.date DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id], row_to_meeting)?;
    rows.collect()
}

/// SCHEDULED meetings starting within `now + lookahead`, date ascending.
/// Read-only; ONGOING/COMPLETED/CANCELLED meetings never appear regardless
/// of date.
pub fn find_upcoming(
    conn: &Connection,
    now: DateTime<Utc>,
    lookahead: Duration,
) -> rusqlite::Result<Vec<Meeting>> {
    let cutoff = db::fmt_utc(now + lookahead);
    let sql = format!("{SELECT_MEETING} WHERE status = 'SCHEDULED' AND date <= ?1 ORDER BY date ASC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![cutoff], row_to_meeting)?;
    rows.collect()
}

/// Append participants. Requires an editable (SCHEDULED) meeting and a
/// non-empty email per entry; duplicate emails pass through. Nothing is
/// written if any entry is invalid.
pub fn add_participants(
    conn: &Connection,
    meeting_id: i64,
    entries: &[NewParticipant],
) -> Result<Vec<Participant>, AppError> {
    let meeting = find_by_id(conn, meeting_id)?.ok_or(AppError::NotFound)?;
    if !meeting.can_edit() {
        return Err(AppError::NotEditable(meeting.status.as_str().to_string()));
    }
    for entry in entries {
        if entry.email.trim().is_empty() {
            return Err(AppError::Validation(
                "Participant email is required".to_string(),
            ));
        }
    }

    for entry in entries {
        conn.execute(
            "INSERT INTO meeting_participants (meeting_id, user_id, email, role) \
             VALUES (?1, ?2, ?3, ?4)",
            params![meeting_id, entry.user_id, entry.email.trim(), entry.role],
        )?;
    }
    find_participants(conn, meeting_id).map_err(Into::into)
}

/// Participants in insertion order.
pub fn find_participants(conn: &Connection, meeting_id: i64) -> rusqlite::Result<Vec<Participant>> {
    let mut stmt = conn.prepare(
        "SELECT id, meeting_id, user_id, email, role, joined_at \
         FROM meeting_participants WHERE meeting_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![meeting_id], row_to_participant)?;
    rows.collect()
}

/// Move a meeting along the lifecycle graph. Anything not on the graph —
/// including any move out of a terminal status — is rejected and the row is
/// left untouched.
pub fn transition(
    conn: &Connection,
    meeting_id: i64,
    target: MeetingStatus,
) -> Result<Meeting, AppError> {
    let meeting = find_by_id(conn, meeting_id)?.ok_or(AppError::NotFound)?;
    if !meeting.status.can_transition_to(target) {
        return Err(AppError::InvalidTransition {
            from: meeting.status.as_str().to_string(),
            to: target.as_str().to_string(),
        });
    }
    conn.execute(
        "UPDATE meetings SET status = ?1, \
         updated_at = strftime('%Y-%m-%dT%H:%M:%SZ','now') WHERE id = ?2",
        params![target.as_str(), meeting_id],
    )?;
    find_by_id(conn, meeting_id)?.ok_or(AppError::NotFound)
}

/// Append a reminder. Reminder bookkeeping is append-only and exempt from
/// the editable check — a reminder may be added to a meeting in any state.
pub fn add_reminder(
    conn: &Connection,
    meeting_id: i64,
    fire_at: DateTime<Utc>,
) -> Result<Reminder, AppError> {
    find_by_id(conn, meeting_id)?.ok_or(AppError::NotFound)?;
    conn.execute(
        "INSERT INTO meeting_reminders (meeting_id, fire_at) VALUES (?1, ?2)",
        params![meeting_id, db::fmt_utc(fire_at)],
    )?;
    let id = conn.last_insert_rowid();
    Ok(Reminder {
        id,
        meeting_id,
        fire_at,
        sent: false,
    })
}

/// Every unsent reminder due at or before `now`, paired with its meeting.
/// Pure query — marking as sent is a separate operation.
pub fn due_reminders(
    conn: &Connection,
    now: DateTime<Utc>,
) -> rusqlite::Result<Vec<(Meeting, Reminder)>> {
    let mut stmt = conn.prepare(
        "SELECT m.id, m.title, m.description, m.platform, m.meeting_link, m.date, \
                m.duration, m.status, m.created_by, m.external_event_id, \
                m.created_at, m.updated_at, \
                r.id AS reminder_id, r.fire_at, r.sent \
         FROM meeting_reminders r \
         JOIN meetings m ON m.id = r.meeting_id \
         WHERE r.sent = 0 AND r.fire_at <= ?1 \
         ORDER BY r.fire_at ASC",
    )?;
    let rows = stmt.query_map(params![db::fmt_utc(now)], |row| {
        let meeting = row_to_meeting(row)?;
        let fire_at_raw: String = row.get("fire_at")?;
        let reminder = Reminder {
            id: row.get("reminder_id")?,
            meeting_id: meeting.id,
            fire_at: parse_instant(&fire_at_raw)?,
            sent: row.get("sent")?,
        };
        Ok((meeting, reminder))
    })?;
    rows.collect()
}

pub fn mark_reminder_sent(conn: &Connection, reminder_id: i64) -> Result<(), AppError> {
    let changed = conn.execute(
        "UPDATE meeting_reminders SET sent = 1 WHERE id = ?1",
        params![reminder_id],
    )?;
    if changed == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

pub fn count(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM meetings", [], |row| row.get(0))
}

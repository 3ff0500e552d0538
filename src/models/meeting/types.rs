use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Meeting lifecycle.
///
/// ```text
/// SCHEDULED -> ONGOING -> COMPLETED
///     |           |
///     +-----------+----> CANCELLED
/// ```
///
/// COMPLETED and CANCELLED are terminal. Everything else is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeetingStatus {
    Scheduled,
    Ongoing,
    Completed,
    Cancelled,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingStatus::Scheduled => "SCHEDULED",
            MeetingStatus::Ongoing => "ONGOING",
            MeetingStatus::Completed => "COMPLETED",
            MeetingStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<MeetingStatus> {
        match s {
            "SCHEDULED" => Some(MeetingStatus::Scheduled),
            "ONGOING" => Some(MeetingStatus::Ongoing),
            "COMPLETED" => Some(MeetingStatus::Completed),
            "CANCELLED" => Some(MeetingStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, MeetingStatus::Completed | MeetingStatus::Cancelled)
    }

    pub fn can_transition_to(&self, target: MeetingStatus) -> bool {
        use MeetingStatus::*;
        matches!(
            (self, target),
            (Scheduled, Ongoing) | (Scheduled, Cancelled) | (Ongoing, Completed) | (Ongoing, Cancelled)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Platform {
    Google,
    Zoom,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Google => "GOOGLE",
            Platform::Zoom => "ZOOM",
        }
    }

    pub fn parse(s: &str) -> Option<Platform> {
        match s {
            "GOOGLE" => Some(Platform::Google),
            "ZOOM" => Some(Platform::Zoom),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Meeting {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub platform: Platform,
    /// Globally unique join link; a meeting row never exists without one.
    pub meeting_link: String,
    pub date: DateTime<Utc>,
    /// Minutes, always positive.
    pub duration: i64,
    pub status: MeetingStatus,
    /// Creator, immutable after creation.
    pub created_by: i64,
    /// Opaque reference into the external calendar system.
    pub external_event_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Meeting {
    /// Editing operations are permitted only while still SCHEDULED.
    pub fn can_edit(&self) -> bool {
        self.status == MeetingStatus::Scheduled
    }
}

pub struct NewMeeting {
    pub title: String,
    pub description: Option<String>,
    pub platform: Platform,
    pub meeting_link: String,
    pub date: DateTime<Utc>,
    pub duration: i64,
    pub created_by: i64,
    pub external_event_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Participant {
    pub id: i64,
    pub meeting_id: i64,
    /// Weak reference: externally-invited attendees have no account.
    pub user_id: Option<i64>,
    pub email: String,
    pub role: String,
    pub joined_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewParticipant {
    pub user_id: Option<i64>,
    pub email: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Reminder {
    pub id: i64,
    pub meeting_id: i64,
    pub fire_at: DateTime<Utc>,
    pub sent: bool,
}

//! Calendar service client.
//!
//! Meeting links come from a separate calendar service that talks to the
//! actual Google/Zoom APIs. The service is behind the `CalendarProvider`
//! trait so the scheduling coordinator can be exercised against a stub.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Timeout for calendar requests. A hung upstream must surface as a
/// scheduling failure, not a hung request.
const CALENDAR_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub summary: String,
    pub description: String,
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    pub attendees: Vec<String>,
    pub time_zone: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEvent {
    pub join_link: String,
    pub external_event_id: String,
}

#[derive(Debug)]
pub enum CalendarError {
    /// Transport fault, timeout, or cancelled request.
    Transport(String),
    /// The service answered with a non-success status.
    Rejected(u16),
}

impl fmt::Display for CalendarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarError::Transport(e) => write!(f, "calendar request failed: {e}"),
            CalendarError::Rejected(status) => {
                write!(f, "calendar service returned status {status}")
            }
        }
    }
}

pub trait CalendarProvider {
    fn create_event(
        &self,
        req: &CreateEventRequest,
    ) -> impl Future<Output = Result<CreatedEvent, CalendarError>>;
}

/// HTTP implementation against the calendar service.
pub struct HttpCalendarProvider {
    client: Client,
    base_url: String,
}

impl HttpCalendarProvider {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(CALENDAR_REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build calendar HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl CalendarProvider for HttpCalendarProvider {
    async fn create_event(&self, req: &CreateEventRequest) -> Result<CreatedEvent, CalendarError> {
        let url = format!("{}/api/calendar/create-event", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(req)
            .send()
            .await
            .map_err(|e| CalendarError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CalendarError::Rejected(response.status().as_u16()));
        }
        response
            .json::<CreatedEvent>()
            .await
            .map_err(|e| CalendarError::Transport(e.to_string()))
    }
}

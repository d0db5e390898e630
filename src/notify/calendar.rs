//! Google Calendar events for booked appointments.

use chrono::{FixedOffset, NaiveDate, NaiveTime, TimeZone};
use serde::Deserialize;
use serde_json::json;

use super::NotifyError;
use entity::appointment;

const EVENTS_URL: &str = "https://www.googleapis.com/calendar/v3/calendars/primary/events";

#[derive(Debug, Clone)]
pub struct CalendarClient {
    http_client: reqwest::Client,
    utc_offset_minutes: i32,
}

#[derive(Debug, Deserialize)]
struct EventResponse {
    id: String,
}

impl CalendarClient {
    pub fn new(utc_offset_minutes: i32) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            utc_offset_minutes,
        }
    }

    /// Inserts an event on the user's primary calendar and returns its id.
    pub async fn create_event(
        &self,
        access_token: &str,
        appt: &appointment::Model,
    ) -> Result<String, NotifyError> {
        let body = self.event_body(appt)?;
        let response = self
            .http_client
            .post(EVENTS_URL)
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Calendar(e.to_string()))?
            .error_for_status()
            .map_err(|e| NotifyError::Calendar(e.to_string()))?;

        let event: EventResponse = response
            .json()
            .await
            .map_err(|e| NotifyError::Calendar(e.to_string()))?;
        Ok(event.id)
    }

    pub fn event_body(&self, appt: &appointment::Model) -> Result<serde_json::Value, NotifyError> {
        let start = self.rfc3339(appt.appointment_date, &appt.start_time)?;
        let end = self.rfc3339(appt.appointment_date, &appt.end_time)?;
        Ok(json!({
            "summary": format!("ITSO ID appointment ({})", appt.purpose.as_str()),
            "description": format!("Reference: {}", appt.id),
            "start": { "dateTime": start },
            "end": { "dateTime": end },
        }))
    }

    fn rfc3339(&self, date: NaiveDate, time: &str) -> Result<String, NotifyError> {
        let time = NaiveTime::parse_from_str(time, "%H:%M")
            .map_err(|e| NotifyError::Calendar(format!("bad time {time}: {e}")))?;
        let offset = FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .ok_or_else(|| NotifyError::Calendar("bad UTC offset".to_string()))?;
        offset
            .from_local_datetime(&date.and_time(time))
            .single()
            .map(|dt| dt.to_rfc3339())
            .ok_or_else(|| NotifyError::Calendar("ambiguous local time".to_string()))
    }
}

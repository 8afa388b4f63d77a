use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::shared::utils::date::parse_all_day;

#[allow(dead_code)]
#[derive(Deserialize, Debug)]
pub struct CalendarListResponse {
    #[serde(rename = "kind")]
    pub kind: Option<String>,
    #[serde(rename = "etag")]
    pub etag: Option<String>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
    #[serde(rename = "items", default)]
    pub items: Vec<CalendarListEntry>,
}

#[allow(dead_code)]
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct CalendarListEntry {
    #[serde(rename = "id")]
    pub id: String,
    #[serde(rename = "summary")]
    pub summary: Option<String>,
    #[serde(rename = "timeZone")]
    pub time_zone: Option<String>,
    #[serde(rename = "accessRole")]
    pub access_role: Option<String>,
    #[serde(rename = "primary")]
    pub primary: Option<bool>,
}

#[allow(dead_code)]
#[derive(Deserialize, Debug)]
pub struct CalendarEventsResponse {
    #[serde(rename = "kind")]
    pub kind: Option<String>,
    #[serde(rename = "summary")]
    pub summary: Option<String>,
    #[serde(rename = "timeZone")]
    pub time_zone: Option<String>,
    #[serde(rename = "nextPageToken")]
    pub next_page_token: Option<String>,
    #[serde(rename = "items", default)]
    pub items: Vec<EventItem>,
}

#[allow(dead_code)]
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct EventItem {
    #[serde(rename = "id")]
    pub id: Option<String>,
    #[serde(rename = "status")]
    pub status: Option<String>,
    #[serde(rename = "summary")]
    pub summary: Option<String>,
    #[serde(rename = "start")]
    pub start: Option<EventDateTime>,
    #[serde(rename = "end")]
    pub end: Option<EventDateTime>,
}

#[allow(dead_code)]
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct EventDateTime {
    #[serde(rename = "dateTime", skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(rename = "timeZone", skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
    #[serde(rename = "date", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl EventItem {
    pub fn is_all_day(&self) -> bool {
        matches!(&self.start, Some(EventDateTime { date: Some(_), .. }))
    }

    /// Start and end dates of an all-day event. `None` for timed events or
    /// unparseable dates.
    pub fn all_day_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = parse_all_day(self.start.as_ref()?.date.as_deref()?)?;
        let end = parse_all_day(self.end.as_ref()?.date.as_deref()?)?;
        Some((start, end))
    }

    pub fn start_date_time(&self) -> Option<&str> {
        self.start.as_ref()?.date_time.as_deref()
    }

    pub fn summary_text(&self) -> &str {
        self.summary.as_deref().unwrap_or("")
    }

    /// Human-readable start: the all-day date or the raw timestamp.
    pub fn start_display(&self) -> &str {
        match &self.start {
            Some(EventDateTime {
                date_time: Some(dt),
                ..
            }) => dt,
            Some(EventDateTime { date: Some(d), .. }) => d,
            _ => "-",
        }
    }
}

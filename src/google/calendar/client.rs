use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{debug, info};

use super::model::{CalendarEventsResponse, CalendarListEntry, CalendarListResponse, EventItem};
use super::EventSource;

const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

pub struct GoogleCalendarClient {
    client: Client,
    access_token: String,
    base_url: String,
}

impl GoogleCalendarClient {
    pub fn new<T: Into<String>>(token: T) -> Self {
        GoogleCalendarClient {
            client: Client::new(),
            access_token: token.into(),
            base_url: CALENDAR_API_BASE.to_string(),
        }
    }

    pub async fn fetch_calendar_list_page(
        &self,
        page_token: Option<&str>,
    ) -> anyhow::Result<CalendarListResponse> {
        let url = format!("{}/users/me/calendarList", self.base_url);

        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        debug!(url = %url, page_token = ?page_token, "fetching calendar list page");
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&query)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<CalendarListResponse>().await?)
    }

    pub async fn fetch_calendar_events_page(
        &self,
        calendar_id: &str,
        page_token: Option<&str>,
    ) -> anyhow::Result<CalendarEventsResponse> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("invalid calendar base url: {}", self.base_url))?
            .extend(&["calendars", calendar_id, "events"]);

        let mut query: Vec<(&str, &str)> = vec![("singleEvents", "true")];
        if let Some(token) = page_token {
            query.push(("pageToken", token));
        }

        debug!(url = %url, page_token = ?page_token, "fetching events page");
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .query(&query)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<CalendarEventsResponse>().await?)
    }
}

#[async_trait]
impl EventSource for GoogleCalendarClient {
    async fn list_calendars(&self) -> anyhow::Result<Vec<CalendarListEntry>> {
        let mut calendars = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut page = self.fetch_calendar_list_page(page_token.as_deref()).await?;
            calendars.append(&mut page.items);

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        info!(count = calendars.len(), "listed calendars");
        Ok(calendars)
    }

    async fn list_events(&self, calendar_id: &str) -> anyhow::Result<Vec<EventItem>> {
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut page = self
                .fetch_calendar_events_page(calendar_id, page_token.as_deref())
                .await?;
            events.append(&mut page.items);

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        info!(calendar_id, count = events.len(), "listed events");
        Ok(events)
    }
}

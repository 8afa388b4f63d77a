pub mod client;
pub mod model;

use async_trait::async_trait;

use self::model::{CalendarListEntry, EventItem};

/// Read side of the planning pipeline: where term calendars and their
/// events come from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventSource {
    async fn list_calendars(&self) -> anyhow::Result<Vec<CalendarListEntry>>;

    async fn list_events(&self, calendar_id: &str) -> anyhow::Result<Vec<EventItem>>;
}

use std::collections::BTreeMap;

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::Serialize;
use tracing::debug;

use crate::core::document::DocumentKey;
use crate::core::subject::Subject;
use crate::core::week::WeekBucket;
use crate::google::calendar::model::EventItem;
use crate::shared::utils::date::local_date;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonRecord {
    pub date: NaiveDate,
    pub summary: String,
}

/// Timed events whose summary ends with `suffix`, dated in `tz` when given
/// and by the timestamp's own offset otherwise. Listing order is preserved.
pub fn lesson_events(events: &[EventItem], suffix: &str, tz: Option<&Tz>) -> Vec<LessonRecord> {
    events
        .iter()
        .filter(|ev| !ev.is_all_day() && ev.summary_text().ends_with(suffix))
        .filter_map(|ev| {
            let date = ev.start_date_time().and_then(|dt| local_date(dt, tz));
            if date.is_none() {
                debug!(id = ?ev.id, "skipping lesson without a usable start time");
            }
            Some(LessonRecord {
                date: date?,
                summary: ev.summary_text().to_string(),
            })
        })
        .collect()
}

/// One entry per week. For each marker date in order, every lesson on that
/// date is appended in listing order.
pub fn group_lessons(
    year: i32,
    term: u8,
    subject: Subject,
    weeks: &[WeekBucket],
    lessons: &[LessonRecord],
) -> BTreeMap<DocumentKey, Vec<LessonRecord>> {
    weeks
        .iter()
        .map(|week| {
            let key = DocumentKey {
                year,
                term,
                week: week.number,
                subject,
            };
            let records = week
                .dates
                .iter()
                .flat_map(|date| lessons.iter().filter(move |l| l.date == *date))
                .cloned()
                .collect();
            (key, records)
        })
        .collect()
}

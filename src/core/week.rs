use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use tracing::warn;

use crate::core::error::PlanError;
use crate::google::calendar::model::EventItem;
use crate::shared::utils::date::is_single_day;

pub const DAYS_PER_WEEK: usize = 5;

/// One teaching week: up to five marker dates, numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekBucket {
    pub number: u32,
    pub dates: Vec<NaiveDate>,
}

/// Dates of the single-day all-day events, in calendar order.
pub fn marker_dates(events: &[EventItem]) -> Vec<NaiveDate> {
    events
        .iter()
        .filter_map(EventItem::all_day_range)
        .filter(|(start, end)| is_single_day(*start, *end))
        .map(|(start, _)| start)
        .collect()
}

pub fn partition_weeks(mut dates: Vec<NaiveDate>) -> Result<Vec<WeekBucket>, PlanError> {
    dates.sort();

    match dates.first() {
        None => {
            warn!("no week markers found");
            return Ok(vec![]);
        }
        Some(first) if first.weekday() != Weekday::Mon => {
            return Err(PlanError::TermNotStartingOnMonday(*first));
        }
        Some(_) => {}
    }

    let weeks: Vec<WeekBucket> = dates
        .chunks(DAYS_PER_WEEK)
        .enumerate()
        .map(|(i, chunk)| WeekBucket {
            number: i as u32 + 1,
            dates: chunk.to_vec(),
        })
        .collect();

    if let Some(last) = weeks.last().filter(|w| w.dates.len() < DAYS_PER_WEEK) {
        warn!(
            week = last.number,
            days = last.dates.len(),
            "last week is shorter than {} days",
            DAYS_PER_WEEK
        );
    }

    Ok(weeks)
}

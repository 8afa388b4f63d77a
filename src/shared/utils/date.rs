use chrono::{DateTime, Days, NaiveDate};
use chrono_tz::Tz;

const ALL_DAY_FORMAT: &str = "%Y-%m-%d";

pub fn parse_all_day(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, ALL_DAY_FORMAT).ok()
}

/// An all-day event covers a single day when its end equals its start, or
/// when the end is the exclusive next day as Google Calendar reports it.
pub fn is_single_day(start: NaiveDate, end: NaiveDate) -> bool {
    end == start || start.checked_add_days(Days::new(1)) == Some(end)
}

/// Calendar date of an RFC 3339 timestamp. Without `tz` the timestamp's own
/// offset decides the date.
pub fn local_date(date_time: &str, tz: Option<&Tz>) -> Option<NaiveDate> {
    let dt = DateTime::parse_from_rfc3339(date_time).ok()?;
    Some(match tz {
        Some(tz) => dt.with_timezone(tz).date_naive(),
        None => dt.date_naive(),
    })
}

/// "Monday 22 July"
pub fn day_label(date: NaiveDate) -> String {
    date.format("%A %-d %B").to_string()
}

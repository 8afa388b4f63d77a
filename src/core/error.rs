use chrono::{Datelike, NaiveDate};
use thiserror::Error;

use crate::core::subject::Subject;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("The first week marker {0} is a {day}; terms must start on a Monday.", day = .0.weekday())]
    TermNotStartingOnMonday(NaiveDate),

    #[error("No calendar found for {year} term {term}. Add it to calendar.terms in your config.")]
    CalendarNotFound { year: i32, term: u8 },

    #[error("No destination folder configured for {0}. Please set subjects.{key}.folderID in your config.", key = .0.config_key())]
    FolderNotConfigured(Subject),
}

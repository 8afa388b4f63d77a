pub mod calendar;
pub mod drive;
pub mod oauth;

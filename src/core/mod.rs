pub mod document;
pub mod error;
pub mod lesson;
pub mod planner;
pub mod subject;
pub mod template;
pub mod week;

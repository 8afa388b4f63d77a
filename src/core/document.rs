use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::config::SubjectSettings;
use crate::core::lesson::LessonRecord;
use crate::core::subject::Subject;
use crate::core::template;
use crate::shared::utils::date::day_label;

pub const DOCUMENT_EXTENSION: &str = "html";

/// Identifies one planning document. Ordering is year, term, week, subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DocumentKey {
    pub year: i32,
    pub term: u8,
    pub week: u32,
    pub subject: Subject,
}

impl DocumentKey {
    /// "2019 - Term 3 - Week 01 - Maths"
    pub fn file_stem(&self) -> String {
        format!(
            "{} - Term {} - Week {:02} - {}",
            self.year, self.term, self.week, self.subject
        )
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.file_stem(), DOCUMENT_EXTENSION)
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_stem())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LessonHeading {
    pub heading: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanningDocument {
    pub title: String,
    pub table: Vec<String>,
    pub lessons: Vec<LessonHeading>,
}

pub fn lesson_heading(position: usize, lesson: &LessonRecord, code_length: usize) -> String {
    let code: String = lesson.summary.chars().take(code_length).collect();
    format!("{} - {} - L{}", day_label(lesson.date), code, position)
}

impl PlanningDocument {
    pub fn build(key: &DocumentKey, lessons: &[LessonRecord], settings: &SubjectSettings) -> Self {
        Self {
            title: key.file_stem(),
            table: settings.table.clone(),
            lessons: lessons
                .iter()
                .enumerate()
                .map(|(i, lesson)| LessonHeading {
                    heading: lesson_heading(i + 1, lesson, settings.code_length),
                })
                .collect(),
        }
    }

    pub fn render(&self, template: &str) -> anyhow::Result<String> {
        template::generate(template, self)
    }
}

/// Writes the rendered document into `dir`, replacing any previous copy.
pub fn save_document(dir: &Path, key: &DocumentKey, rendered: &str) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(key.file_name());
    fs::write(&path, rendered)?;
    info!(path = %path.display(), "saved document");
    Ok(path)
}

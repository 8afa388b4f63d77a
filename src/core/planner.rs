use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::core::document::{save_document, DocumentKey, PlanningDocument};
use crate::core::error::PlanError;
use crate::core::lesson::{group_lessons, lesson_events, LessonRecord};
use crate::core::subject::Subject;
use crate::core::week::{marker_dates, partition_weeks, WeekBucket};
use crate::google::calendar::model::{CalendarListEntry, EventItem};
use crate::google::calendar::EventSource;
use crate::google::drive::model::{conversion_for, UploadRequest};
use crate::google::drive::DocumentUploader;

pub type Grouping = BTreeMap<DocumentKey, Vec<LessonRecord>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedDocument {
    pub key: DocumentKey,
    pub path: PathBuf,
    pub remote_id: Option<String>,
}

/// Id of the first calendar titled `<prefix><term>...<year>`.
pub fn find_term_calendar(
    calendars: &[CalendarListEntry],
    prefix: &str,
    year: i32,
    term: u8,
) -> Option<String> {
    let term = term.to_string();
    let year = year.to_string();

    calendars
        .iter()
        .find(|calendar| {
            let Some(title) = calendar.summary.as_deref().map(str::trim) else {
                return false;
            };
            let Some(rest) = title
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix(term.as_str()))
            else {
                return false;
            };
            !rest.starts_with(|c: char| c.is_ascii_digit()) && title.ends_with(year.as_str())
        })
        .map(|calendar| calendar.id.clone())
}

pub struct Planner<S, U> {
    config: Config,
    source: S,
    uploader: U,
}

impl<S: EventSource, U: DocumentUploader> Planner<S, U> {
    pub fn new(config: Config, source: S, uploader: U) -> Self {
        Self {
            config,
            source,
            uploader,
        }
    }

    pub async fn calendars(&self) -> anyhow::Result<Vec<CalendarListEntry>> {
        self.source.list_calendars().await
    }

    /// Configured calendar id for the term, else the first calendar whose
    /// title follows the naming convention.
    pub async fn calendar_id(&self, year: i32, term: u8) -> anyhow::Result<Option<String>> {
        if let Some(id) = self.config.calendar.calendar_id_for(year, term) {
            return Ok(Some(id.to_string()));
        }

        let calendars = self.source.list_calendars().await?;
        Ok(find_term_calendar(
            &calendars,
            &self.config.calendar.title_prefix,
            year,
            term,
        ))
    }

    pub async fn events(&self, year: i32, term: u8) -> anyhow::Result<Vec<EventItem>> {
        let calendar_id = self
            .calendar_id(year, term)
            .await?
            .ok_or(PlanError::CalendarNotFound { year, term })?;

        info!(year, term, calendar_id = %calendar_id, "fetching term events");
        self.source.list_events(&calendar_id).await
    }

    fn group_events(
        &self,
        events: &[EventItem],
        weeks: &[WeekBucket],
        year: i32,
        term: u8,
        subject: Subject,
    ) -> Grouping {
        let settings = self.config.subjects.get(subject);
        let lessons = lesson_events(events, &settings.suffix, self.config.settings.tz.as_ref());
        info!(%subject, lessons = lessons.len(), weeks = weeks.len(), "grouping lessons");
        group_lessons(year, term, subject, weeks, &lessons)
    }

    pub async fn group(
        &self,
        year: i32,
        term: u8,
        subjects: &[Subject],
    ) -> anyhow::Result<Vec<(Subject, Grouping)>> {
        let events = self.events(year, term).await?;
        let weeks = partition_weeks(marker_dates(&events))?;

        Ok(subjects
            .iter()
            .map(|&subject| {
                (
                    subject,
                    self.group_events(&events, &weeks, year, term, subject),
                )
            })
            .collect())
    }

    /// Renders and saves every week's document for each subject, uploading
    /// each one straight after it is saved when `upload` is set.
    pub async fn generate(
        &self,
        year: i32,
        term: u8,
        subjects: &[Subject],
        upload: bool,
    ) -> anyhow::Result<Vec<GeneratedDocument>> {
        if upload {
            if let Some(&subject) = subjects
                .iter()
                .find(|s| self.config.subjects.get(**s).folder_id.is_none())
            {
                return Err(PlanError::FolderNotConfigured(subject).into());
            }
        }

        let mut generated = Vec::new();
        for (subject, grouping) in self.group(year, term, subjects).await? {
            let settings = self.config.subjects.get(subject);

            for (key, lessons) in &grouping {
                let document = PlanningDocument::build(key, lessons, settings);
                let rendered = document.render(&self.config.output.template)?;
                let path = save_document(&self.config.output.dir, key, &rendered)?;

                let remote_id = match (&settings.folder_id, upload) {
                    (Some(folder_id), true) => Some(self.upload(key, &path, folder_id).await?),
                    _ => None,
                };

                generated.push(GeneratedDocument {
                    key: *key,
                    path,
                    remote_id,
                });
            }
        }

        info!(count = generated.len(), upload, "generated documents");
        Ok(generated)
    }

    async fn upload(
        &self,
        key: &DocumentKey,
        path: &Path,
        folder_id: &str,
    ) -> anyhow::Result<String> {
        let conversion = conversion_for(path)
            .ok_or_else(|| anyhow::anyhow!("no upload conversion for {}", path.display()))?;
        let content = tokio::fs::read(path).await?;

        self.uploader
            .upload(&UploadRequest {
                name: key.file_stem(),
                parent_folder_id: folder_id.to_string(),
                conversion,
                content,
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::templates::planning::STANDARD;
    use crate::config::{
        CalendarSettings, GoogleOAuth2, GoogleSource, Output, Settings, Source, SubjectSettings,
        Subjects, TermCalendar,
    };
    use crate::google::calendar::model::EventDateTime;
    use crate::google::calendar::MockEventSource;
    use crate::google::drive::model::GOOGLE_DOCS_MIME_TYPE;
    use crate::google::drive::MockDocumentUploader;
    use chrono::{Datelike, Days, NaiveDate};

    fn config(output_dir: &Path, terms: Vec<TermCalendar>) -> Config {
        Config {
            source: Source {
                google: GoogleSource {
                    oauth2: GoogleOAuth2 {
                        client_id: "id".to_string(),
                        client_secret: "secret".to_string(),
                        redirect_url: "http://127.0.0.1:9004".to_string(),
                        scopes: vec![],
                    },
                },
            },
            calendar: CalendarSettings {
                title_prefix: "Term ".to_string(),
                terms,
            },
            subjects: Subjects {
                maths: SubjectSettings {
                    folder_id: Some("maths-folder".to_string()),
                    ..SubjectSettings::defaults(Subject::Maths)
                },
                science: SubjectSettings::defaults(Subject::Science),
            },
            output: Output {
                dir: output_dir.to_path_buf(),
                template: STANDARD.to_string(),
            },
            settings: Settings {
                tz: None,
                oauth_file_path: "unused".to_string(),
            },
        }
    }

    fn calendar(id: &str, summary: &str) -> CalendarListEntry {
        CalendarListEntry {
            id: id.to_string(),
            summary: Some(summary.to_string()),
            time_zone: None,
            access_role: None,
            primary: None,
        }
    }

    fn marker(day: NaiveDate) -> EventItem {
        let all_day = |d: NaiveDate| EventDateTime {
            date_time: None,
            time_zone: None,
            date: Some(d.to_string()),
        };
        EventItem {
            id: None,
            status: None,
            summary: Some(format!("{}", day.format("%A"))),
            start: Some(all_day(day)),
            end: Some(all_day(day.checked_add_days(Days::new(1)).unwrap())),
        }
    }

    fn timed(summary: &str, start: &str) -> EventItem {
        EventItem {
            id: None,
            status: None,
            summary: Some(summary.to_string()),
            start: Some(EventDateTime {
                date_time: Some(start.to_string()),
                time_zone: None,
                date: None,
            }),
            end: None,
        }
    }

    /// Ten markers over two Monday-started weeks plus two Maths and one
    /// Science lesson per week.
    fn term_events(first_day: NaiveDate) -> Vec<EventItem> {
        let mut events: Vec<EventItem> = first_day
            .iter_days()
            .filter(|d| d.weekday().number_from_monday() <= 5)
            .take(10)
            .map(marker)
            .collect();
        events.extend([
            timed("10MAT1 Fractions Line 4", "2019-07-22T09:00:00+00:00"),
            timed("10MAT1 Decimals Line 4", "2019-07-24T09:00:00+00:00"),
            timed("9SCI2 Cells Line 5", "2019-07-23T11:00:00+00:00"),
            timed("10MAT1 Ratios Line 4", "2019-07-29T09:00:00+00:00"),
            timed("10MAT1 Rates Line 4", "2019-08-01T09:00:00+00:00"),
            timed("9SCI2 Atoms Line 5", "2019-07-30T11:00:00+00:00"),
            timed("Assembly", "2019-07-26T09:00:00+00:00"),
        ]);
        events
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2019, 7, 22).unwrap()
    }

    #[test]
    fn test_find_term_calendar() {
        let calendars = vec![
            calendar("personal", "Birthdays"),
            calendar("t2-2019", "Term 2 2019"),
            calendar("t3-2018", "Term 3 - 2018"),
            calendar("t3-2019", "Term 3 - 2019"),
            calendar("t3-2019-copy", "Term 3 (copy) 2019"),
        ];

        assert_eq!(
            find_term_calendar(&calendars, "Term ", 2019, 3),
            Some("t3-2019".to_string())
        );
        assert_eq!(
            find_term_calendar(&calendars, "Term ", 2019, 2),
            Some("t2-2019".to_string())
        );
        assert_eq!(find_term_calendar(&calendars, "Term ", 2019, 4), None);
        assert_eq!(find_term_calendar(&calendars, "Term ", 2020, 3), None);
    }

    #[test]
    fn test_find_term_calendar_does_not_match_longer_term_numbers() {
        let calendars = vec![calendar("t12", "Term 12 2019")];

        assert_eq!(find_term_calendar(&calendars, "Term ", 2019, 1), None);
    }

    #[tokio::test]
    async fn test_calendar_id_prefers_configured_terms() -> anyhow::Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let mut source = MockEventSource::new();
        source.expect_list_calendars().never();

        let planner = Planner::new(
            config(
                temp_dir.path(),
                vec![TermCalendar {
                    year: 2019,
                    term: 3,
                    calendar_id: "configured".to_string(),
                }],
            ),
            source,
            MockDocumentUploader::new(),
        );

        assert_eq!(
            planner.calendar_id(2019, 3).await?,
            Some("configured".to_string())
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_calendar_is_an_error() -> anyhow::Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let mut source = MockEventSource::new();
        source
            .expect_list_calendars()
            .returning(|| Ok(vec![calendar("other", "Term 1 2019")]));
        source.expect_list_events().never();

        let planner = Planner::new(
            config(temp_dir.path(), vec![]),
            source,
            MockDocumentUploader::new(),
        );

        assert_eq!(planner.calendar_id(2019, 3).await?, None);
        let err = planner
            .generate(2019, 3, &[Subject::Maths], false)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PlanError>(),
            Some(PlanError::CalendarNotFound { year: 2019, term: 3 })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_group_two_weeks() -> anyhow::Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let events = term_events(monday());
        let mut source = MockEventSource::new();
        source
            .expect_list_calendars()
            .returning(|| Ok(vec![calendar("t3-2019", "Term 3 2019")]));
        source
            .expect_list_events()
            .withf(|id: &str| id == "t3-2019")
            .times(1)
            .returning(move |_| Ok(events.clone()));

        let planner = Planner::new(
            config(temp_dir.path(), vec![]),
            source,
            MockDocumentUploader::new(),
        );

        let grouped = planner.group(2019, 3, &[Subject::Maths]).await?;
        let (subject, maths) = &grouped[0];

        assert_eq!(*subject, Subject::Maths);
        assert_eq!(maths.len(), 2);
        let summaries: Vec<Vec<&str>> = maths
            .values()
            .map(|records| records.iter().map(|r| r.summary.as_str()).collect())
            .collect();
        assert_eq!(
            summaries,
            vec![
                vec!["10MAT1 Fractions Line 4", "10MAT1 Decimals Line 4"],
                vec!["10MAT1 Ratios Line 4", "10MAT1 Rates Line 4"],
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_group_dates_lessons_by_their_own_offset() -> anyhow::Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let mut events: Vec<EventItem> = monday()
            .iter_days()
            .take(5)
            .map(marker)
            .collect();
        events.extend([
            timed("10MAT1 Fractions Line 4", "2019-07-22T09:00:00+10:00"),
            timed("10MAT1 Decimals Line 4", "2019-07-26T08:30:00+10:00"),
        ]);
        let mut source = MockEventSource::new();
        source
            .expect_list_calendars()
            .returning(|| Ok(vec![calendar("t3-2019", "Term 3 2019")]));
        source
            .expect_list_events()
            .returning(move |_| Ok(events.clone()));

        let planner = Planner::new(
            config(temp_dir.path(), vec![]),
            source,
            MockDocumentUploader::new(),
        );

        let grouped = planner.group(2019, 3, &[Subject::Maths]).await?;
        let dates: Vec<NaiveDate> = grouped[0]
            .1
            .values()
            .flat_map(|records| records.iter().map(|r| r.date))
            .collect();

        assert_eq!(
            dates,
            vec![monday(), NaiveDate::from_ymd_opt(2019, 7, 26).unwrap()]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_generate_saves_and_uploads() -> anyhow::Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let events = term_events(monday());
        let mut source = MockEventSource::new();
        source.expect_list_calendars().never();
        source
            .expect_list_events()
            .times(1)
            .returning(move |_| Ok(events.clone()));

        let mut uploader = MockDocumentUploader::new();
        uploader
            .expect_upload()
            .withf(|request: &UploadRequest| {
                request.parent_folder_id == "maths-folder"
                    && request.conversion.target == GOOGLE_DOCS_MIME_TYPE
                    && request.name.ends_with(" - Maths")
                    && !request.content.is_empty()
            })
            .times(2)
            .returning(|request| Ok(format!("remote-{}", request.name)));

        let planner = Planner::new(
            config(
                temp_dir.path(),
                vec![TermCalendar {
                    year: 2019,
                    term: 3,
                    calendar_id: "t3-2019".to_string(),
                }],
            ),
            source,
            uploader,
        );

        let generated = planner.generate(2019, 3, &[Subject::Maths], true).await?;

        assert_eq!(generated.len(), 2);
        assert_eq!(
            generated[0].path,
            temp_dir.path().join("2019 - Term 3 - Week 01 - Maths.html")
        );
        assert_eq!(
            generated[1].remote_id.as_deref(),
            Some("remote-2019 - Term 3 - Week 02 - Maths")
        );
        let week_two = std::fs::read_to_string(&generated[1].path)?;
        assert!(week_two.contains("<h2>Monday 29 July - 10MAT1 R - L1</h2>"));
        assert!(week_two.contains("<h2>Thursday 1 August - 10MAT1 R - L2</h2>"));
        Ok(())
    }

    #[tokio::test]
    async fn test_generate_without_upload_skips_uploader() -> anyhow::Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let events = term_events(monday());
        let mut source = MockEventSource::new();
        source
            .expect_list_calendars()
            .returning(|| Ok(vec![calendar("t3-2019", "Term 3 2019")]));
        source
            .expect_list_events()
            .returning(move |_| Ok(events.clone()));
        let mut uploader = MockDocumentUploader::new();
        uploader.expect_upload().never();

        let planner = Planner::new(config(temp_dir.path(), vec![]), source, uploader);

        let generated = planner
            .generate(2019, 3, &Subject::ALL, false)
            .await?;

        assert_eq!(generated.len(), 4);
        assert!(generated.iter().all(|g| g.remote_id.is_none() && g.path.is_file()));
        let science = std::fs::read_to_string(
            temp_dir.path().join("2019 - Term 3 - Week 01 - Science.html"),
        )?;
        assert!(science.contains("<td>Practical</td>"));
        assert!(science.contains("<h2>Tuesday 23 July - 9SCI2 Ce - L1</h2>"));
        Ok(())
    }

    #[tokio::test]
    async fn test_upload_requires_folder_before_fetching() -> anyhow::Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let mut source = MockEventSource::new();
        source.expect_list_calendars().never();
        source.expect_list_events().never();

        let planner = Planner::new(
            config(temp_dir.path(), vec![]),
            source,
            MockDocumentUploader::new(),
        );

        let err = planner
            .generate(2019, 3, &[Subject::Science], true)
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<PlanError>(),
            Some(PlanError::FolderNotConfigured(Subject::Science))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_term_not_starting_on_monday_produces_nothing() -> anyhow::Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let output_dir = temp_dir.path().join("docs");
        let tuesday = NaiveDate::from_ymd_opt(2019, 7, 23).unwrap();
        let events = term_events(tuesday);
        let mut source = MockEventSource::new();
        source
            .expect_list_calendars()
            .returning(|| Ok(vec![calendar("t3-2019", "Term 3 2019")]));
        source
            .expect_list_events()
            .returning(move |_| Ok(events.clone()));
        let mut uploader = MockDocumentUploader::new();
        uploader.expect_upload().never();

        let planner = Planner::new(config(&output_dir, vec![]), source, uploader);

        let err = planner
            .generate(2019, 3, &[Subject::Maths], true)
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<PlanError>(),
            Some(PlanError::TermNotStartingOnMonday(d)) if *d == tuesday
        ));
        assert!(!output_dir.exists());
        Ok(())
    }
}

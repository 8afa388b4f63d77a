pub mod error;
pub mod templates;

use crate::config::error::ConfigError;
use crate::core::subject::Subject;
use crate::shared::utils;
use chrono_tz::Tz;
use mlua::{Lua, Table, Value};
use std::{
    env, fs,
    path::{Path, PathBuf},
};

const DEFAULT_REDIRECT_URL: &str = "http://127.0.0.1:9004";
const DEFAULT_TITLE_PREFIX: &str = "Term ";
const DEFAULT_CODE_LENGTH: usize = 8;
const DEFAULT_SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/drive",
    "https://www.googleapis.com/auth/calendar.readonly",
];

#[derive(Debug, PartialEq, Eq)]
pub struct Config {
    pub source: Source,
    pub calendar: CalendarSettings,
    pub subjects: Subjects,
    pub output: Output,
    pub settings: Settings,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Settings {
    /// Zone used to date lessons. `None` keeps each timestamp's own offset.
    pub tz: Option<Tz>,
    pub oauth_file_path: String,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Source {
    pub google: GoogleSource,
}

#[derive(Debug, PartialEq, Eq)]
pub struct GoogleSource {
    pub oauth2: GoogleOAuth2,
}

#[derive(Debug, PartialEq, Eq)]
pub struct GoogleOAuth2 {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
    pub scopes: Vec<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct CalendarSettings {
    pub title_prefix: String,
    pub terms: Vec<TermCalendar>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermCalendar {
    pub year: i32,
    pub term: u8,
    pub calendar_id: String,
}

impl CalendarSettings {
    pub fn calendar_id_for(&self, year: i32, term: u8) -> Option<&str> {
        self.terms
            .iter()
            .find(|t| t.year == year && t.term == term)
            .map(|t| t.calendar_id.as_str())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Subjects {
    pub maths: SubjectSettings,
    pub science: SubjectSettings,
}

impl Subjects {
    pub fn get(&self, subject: Subject) -> &SubjectSettings {
        match subject {
            Subject::Maths => &self.maths,
            Subject::Science => &self.science,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectSettings {
    /// Lesson events are recognised by this summary suffix.
    pub suffix: String,
    pub folder_id: Option<String>,
    pub table: Vec<String>,
    pub code_length: usize,
}

impl SubjectSettings {
    pub fn defaults(subject: Subject) -> Self {
        Self {
            suffix: subject.default_suffix().to_string(),
            folder_id: None,
            table: subject.default_table(),
            code_length: DEFAULT_CODE_LENGTH,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct Output {
    pub dir: PathBuf,
    pub template: String,
}

pub fn init() -> anyhow::Result<Config> {
    let path_buf = get_config_file_path()?;
    load_config(&path_buf)
}

fn get_config_file_path() -> anyhow::Result<PathBuf> {
    let config_file_path = match env::var("LESSONPLAN_CONFIG_FILE_PATH") {
        Ok(path) => path.trim().to_string(),
        Err(_) => {
            let home_dir =
                env::var("HOME").map_err(|_e| ConfigError::HomeEnvironmentNotFoundError)?;
            format!("{}/.config/lessonplan/config.lua", home_dir)
        }
    };

    let config_file_path_buf = utils::path::expand_tilde(&config_file_path);

    if config_file_path_buf.is_file() {
        Ok(config_file_path_buf)
    } else {
        Err(
            ConfigError::ConfigFileNotFoundError(utils::path::contract_tilde(
                &config_file_path_buf,
            ))
            .into(),
        )
    }
}

fn get_data_dir() -> anyhow::Result<PathBuf> {
    let home_dir = env::var("HOME").map_err(|_e| ConfigError::HomeEnvironmentNotFoundError)?;
    Ok(PathBuf::from(format!("{}/.local/share/lessonplan", home_dir)))
}

fn required<T>(value: Option<T>, field: &str, config_file_path: &Path) -> Result<T, ConfigError> {
    value.ok_or_else(|| {
        ConfigError::RequiredFieldNotFound(
            field.to_owned(),
            utils::path::contract_tilde(config_file_path),
        )
    })
}

fn invalid(field: &str, config_file_path: &Path, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidField(
        field.to_owned(),
        utils::path::contract_tilde(config_file_path),
        reason.into(),
    )
}

fn load_config(config_file_path: &Path) -> anyhow::Result<Config> {
    let lua = Lua::new();

    let config_path = config_file_path
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .to_string_lossy();

    lua.load(format!(
        r#"package.path = package.path .. ";{}/?.lua""#,
        config_path
    ))
    .exec()?;

    let lessonplan_mod = lua.create_table()?;
    let template_sub_mod = lua.create_table()?;
    template_sub_mod
        .set("standard", templates::planning::STANDARD)
        .map_err(|e| ConfigError::LuaRuntimeError(e.to_string()))?;
    lessonplan_mod.set("template", template_sub_mod)?;

    let globals = lua.globals();
    let package: Table = globals.get("package")?;
    let loaded: Table = package.get("loaded")?;

    loaded.set("lessonplan", lessonplan_mod)?;

    let config_code = fs::read_to_string(config_file_path)?;
    let config_eval = lua.load(&config_code).eval()?;

    let Value::Table(config_tbl) = config_eval else {
        return Err(ConfigError::RequiredFieldNotFound(
            "config.lua did not return a table!".to_owned(),
            utils::path::contract_tilde(config_file_path),
        )
        .into());
    };

    let source_tbl = required(
        config_tbl.get::<_, Option<Table>>("source")?,
        "source",
        config_file_path,
    )?;
    let google_tbl = required(
        source_tbl.get::<_, Option<Table>>("google")?,
        "source.google",
        config_file_path,
    )?;
    let oauth2 = load_oauth2(&google_tbl, config_file_path)?;

    let calendar = load_calendar(config_tbl.get::<_, Option<Table>>("calendar")?, config_file_path)?;

    let subjects_tbl = config_tbl.get::<_, Option<Table>>("subjects")?;
    let subjects = Subjects {
        maths: load_subject(subjects_tbl.as_ref(), Subject::Maths, config_file_path)?,
        science: load_subject(subjects_tbl.as_ref(), Subject::Science, config_file_path)?,
    };

    let data_dir = get_data_dir()?;

    let output = match config_tbl.get::<_, Option<Table>>("output")? {
        Some(tbl) => Output {
            dir: tbl
                .get::<_, Option<String>>("dir")?
                .map(|dir| utils::path::expand_tilde(&dir))
                .unwrap_or_else(|| data_dir.join("documents")),
            template: tbl
                .get::<_, Option<String>>("template")?
                .unwrap_or_else(|| templates::planning::STANDARD.to_string()),
        },
        None => Output {
            dir: data_dir.join("documents"),
            template: templates::planning::STANDARD.to_string(),
        },
    };

    let default_oauth_file_path = data_dir.join("oauth").to_string_lossy().to_string();
    let settings = match config_tbl.get::<_, Option<Table>>("settings")? {
        Some(tbl) => {
            let tz = match tbl.get::<_, Option<String>>("TZ")? {
                Some(tz_name) => Some(
                    tz_name
                        .parse::<Tz>()
                        .map_err(|_| invalid("settings.TZ", config_file_path, tz_name.clone()))?,
                ),
                None => None,
            };
            Settings {
                tz,
                oauth_file_path: tbl
                    .get::<_, Option<String>>("oauthFilePath")?
                    .unwrap_or(default_oauth_file_path),
            }
        }
        None => Settings {
            tz: None,
            oauth_file_path: default_oauth_file_path,
        },
    };

    Ok(Config {
        source: Source {
            google: GoogleSource { oauth2 },
        },
        calendar,
        subjects,
        output,
        settings,
    })
}

fn load_oauth2(google_tbl: &Table, config_file_path: &Path) -> anyhow::Result<GoogleOAuth2> {
    let oauth2_tbl = required(
        google_tbl.get::<_, Option<Table>>("oauth2")?,
        "source.google.oauth2",
        config_file_path,
    )?;

    let client_id = required(
        oauth2_tbl.get::<_, Option<String>>("clientID")?,
        "source.google.oauth2.clientID",
        config_file_path,
    )?;
    let client_secret = required(
        oauth2_tbl.get::<_, Option<String>>("clientSecret")?,
        "source.google.oauth2.clientSecret",
        config_file_path,
    )?;
    let redirect_url = oauth2_tbl
        .get::<_, Option<String>>("redirectURL")?
        .unwrap_or_else(|| DEFAULT_REDIRECT_URL.to_string());

    let scopes = match oauth2_tbl.get::<_, Option<Table>>("scopes")? {
        Some(tbl) => tbl.sequence_values().collect::<Result<Vec<String>, _>>()?,
        None => DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
    };

    Ok(GoogleOAuth2 {
        client_id,
        client_secret,
        redirect_url,
        scopes,
    })
}

fn load_calendar(
    calendar_tbl: Option<Table>,
    config_file_path: &Path,
) -> anyhow::Result<CalendarSettings> {
    let Some(calendar_tbl) = calendar_tbl else {
        return Ok(CalendarSettings {
            title_prefix: DEFAULT_TITLE_PREFIX.to_string(),
            terms: vec![],
        });
    };

    let title_prefix = calendar_tbl
        .get::<_, Option<String>>("titlePrefix")?
        .unwrap_or_else(|| DEFAULT_TITLE_PREFIX.to_string());

    let mut terms = Vec::new();
    if let Some(terms_tbl) = calendar_tbl.get::<_, Option<Table>>("terms")? {
        for entry in terms_tbl.sequence_values::<Table>() {
            let entry = entry?;
            let year = required(
                entry.get::<_, Option<i32>>("year")?,
                "calendar.terms[].year",
                config_file_path,
            )?;
            let term = required(
                entry.get::<_, Option<i64>>("term")?,
                "calendar.terms[].term",
                config_file_path,
            )?;
            let term = u8::try_from(term)
                .map_err(|_| invalid("calendar.terms[].term", config_file_path, term.to_string()))?;
            let calendar_id = required(
                entry.get::<_, Option<String>>("calendarID")?,
                "calendar.terms[].calendarID",
                config_file_path,
            )?;
            terms.push(TermCalendar {
                year,
                term,
                calendar_id,
            });
        }
    }

    Ok(CalendarSettings {
        title_prefix,
        terms,
    })
}

fn load_subject(
    subjects_tbl: Option<&Table>,
    subject: Subject,
    config_file_path: &Path,
) -> anyhow::Result<SubjectSettings> {
    let defaults = SubjectSettings::defaults(subject);

    let subject_tbl = match subjects_tbl {
        Some(tbl) => tbl.get::<_, Option<Table>>(subject.config_key())?,
        None => None,
    };
    let Some(subject_tbl) = subject_tbl else {
        return Ok(defaults);
    };

    let field = |name: &str| format!("subjects.{}.{}", subject.config_key(), name);

    let table = match subject_tbl.get::<_, Option<Table>>("table")? {
        Some(tbl) => tbl.sequence_values().collect::<Result<Vec<String>, _>>()?,
        None => defaults.table,
    };

    let code_length = match subject_tbl.get::<_, Option<i64>>("codeLength")? {
        Some(len) if len > 0 => len as usize,
        Some(len) => {
            return Err(invalid(
                &field("codeLength"),
                config_file_path,
                format!("must be positive, got {}", len),
            )
            .into())
        }
        None => defaults.code_length,
    };

    Ok(SubjectSettings {
        suffix: subject_tbl
            .get::<_, Option<String>>("suffix")?
            .unwrap_or(defaults.suffix),
        folder_id: subject_tbl.get::<_, Option<String>>("folderID")?,
        table,
        code_length,
    })
}

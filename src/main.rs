mod config;
mod core;
mod google;
mod shared;

use clap::{ArgAction, Args, Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::core::planner::Planner;
use crate::core::subject::Subject;
use crate::google::calendar::client::GoogleCalendarClient;
use crate::google::drive::client::GoogleDriveClient;
use crate::google::oauth;
use crate::shared::utils::path::expand_tilde;

#[derive(Debug, Parser)]
#[command(
    name = "lessonplan",
    version,
    about = "Builds weekly lesson-planning documents from a term calendar and uploads them to Google Drive."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Args)]
struct TermArgs {
    #[arg(long, help = "School year, e.g. 2019")]
    year: i32,
    #[arg(
        long,
        value_parser = clap::value_parser!(u8).range(1..=9),
        help = "Term number"
    )]
    term: u8,
}

#[derive(Debug, Args)]
struct SubjectArgs {
    #[arg(long, value_enum, help = "Only this subject (default: every subject)")]
    subject: Option<Subject>,
}

impl SubjectArgs {
    fn subjects(&self) -> Vec<Subject> {
        match self.subject {
            Some(subject) => vec![subject],
            None => Subject::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Authorise with Google and cache the token")]
    Auth,
    #[command(about = "List calendars")]
    Calendars,
    #[command(name = "calendar-id", about = "Find the calendar id of a term")]
    CalendarId(TermArgs),
    #[command(about = "List a term's calendar events")]
    Events(TermArgs),
    #[command(about = "List files in Google Drive")]
    Files,
    #[command(about = "Print the week-by-week lesson grouping as JSON")]
    Group {
        #[command(flatten)]
        term: TermArgs,
        #[command(flatten)]
        subject: SubjectArgs,
    },
    #[command(about = "Render weekly planning documents and upload them")]
    Generate {
        #[command(flatten)]
        term: TermArgs,
        #[command(flatten)]
        subject: SubjectArgs,
        #[arg(
            long,
            action = ArgAction::Set,
            default_value = "true",
            value_parser = clap::builder::BoolishValueParser::new(),
            help = "Upload to Drive after saving (True/False)"
        )]
        upload: bool,
    },
}

#[tokio::main]
async fn main() {
    init_logging();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        eprintln!("You need a command name. Please type -h to get help");
        std::process::exit(1);
    };

    if let Err(err) = run(command).await {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
}

fn planner(config: Config, access_token: &str) -> Planner<GoogleCalendarClient, GoogleDriveClient> {
    Planner::new(
        config,
        GoogleCalendarClient::new(access_token),
        GoogleDriveClient::new(access_token),
    )
}

async fn run(command: Commands) -> anyhow::Result<()> {
    let config = config::init()?;
    let token_path = expand_tilde(&config.settings.oauth_file_path);
    let token = oauth::authorize(&config.source.google.oauth2, &token_path).await?;
    let access_token = token.access_token.as_str();

    match command {
        Commands::Auth => {
            println!("Token cached at {}", token_path.display());
        }
        Commands::Calendars => {
            for calendar in planner(config, access_token).calendars().await? {
                println!(
                    "{}\t{}",
                    calendar.id,
                    calendar.summary.as_deref().unwrap_or("(untitled)")
                );
            }
        }
        Commands::CalendarId(TermArgs { year, term }) => {
            match planner(config, access_token).calendar_id(year, term).await? {
                Some(id) => println!("{}", id),
                None => println!("NOT FOUND"),
            }
        }
        Commands::Events(TermArgs { year, term }) => {
            for event in planner(config, access_token).events(year, term).await? {
                println!("{}\t{}", event.start_display(), event.summary_text());
            }
        }
        Commands::Files => {
            for file in GoogleDriveClient::new(access_token).list_files().await? {
                println!(
                    "{}\t{}\t{}",
                    file.id,
                    file.name.as_deref().unwrap_or("(unnamed)"),
                    file.mime_type.as_deref().unwrap_or("-")
                );
            }
        }
        Commands::Group { term, subject } => {
            let grouped = planner(config, access_token)
                .group(term.year, term.term, &subject.subjects())
                .await?;

            let output: Vec<_> = grouped
                .iter()
                .flat_map(|(_, grouping)| grouping.iter())
                .map(|(key, lessons)| {
                    json!({
                        "key": key,
                        "name": key.file_stem(),
                        "lessons": lessons,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Generate {
            term,
            subject,
            upload,
        } => {
            let generated = planner(config, access_token)
                .generate(term.year, term.term, &subject.subjects(), upload)
                .await?;

            for document in generated {
                println!(
                    "{}\t{}\t{}",
                    document.key,
                    document.path.display(),
                    document.remote_id.as_deref().unwrap_or("-")
                );
            }
        }
    }

    Ok(())
}

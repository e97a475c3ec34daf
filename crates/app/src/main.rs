use std::fmt;
use std::sync::Arc;

use assess_core::model::AssessmentId;
use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use services::{ApiConfig, AppServices, Clock, SessionSettings};
use tracing_subscriber::EnvFilter;
use ui::{App, UiApp, build_app_context};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidBaseUrl { raw: String },
    InvalidAssessmentId { raw: String },
    MissingAssessmentId,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidBaseUrl { raw } => write!(f, "invalid --base-url value: {raw}"),
            ArgsError::InvalidAssessmentId { raw } => {
                write!(f, "invalid --assessment-id value: {raw}")
            }
            ArgsError::MissingAssessmentId => write!(f, "report requires --assessment-id"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- ui      [--base-url <url>] [--token <token>]");
    eprintln!("  cargo run -p app -- configs [--base-url <url>] [--token <token>]");
    eprintln!("  cargo run -p app -- results [--base-url <url>] [--token <token>]");
    eprintln!("  cargo run -p app -- report  --assessment-id <id> [--base-url <url>] [--token <token>]");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  ASSESS_API_BASE_URL, ASSESS_API_TOKEN, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Ui,
    Configs,
    Results,
    Report,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "ui" => Some(Self::Ui),
            "configs" => Some(Self::Configs),
            "results" => Some(Self::Results),
            "report" => Some(Self::Report),
            _ => None,
        }
    }
}

struct Args {
    api: ApiConfig,
    assessment_id: Option<AssessmentId>,
}

impl Args {
    /// Environment first, then flags on top.
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut api = ApiConfig::from_env();
        let mut assessment_id = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--base-url" => {
                    let value = require_value(args, "--base-url")?;
                    if !value.starts_with("http://") && !value.starts_with("https://") {
                        return Err(ArgsError::InvalidBaseUrl { raw: value });
                    }
                    api = api.with_base_url(value);
                }
                "--token" => {
                    let value = require_value(args, "--token")?;
                    api = api.with_token(value);
                }
                "--assessment-id" => {
                    let value = require_value(args, "--assessment-id")?;
                    let parsed: u64 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidAssessmentId { raw: value.clone() })?;
                    assessment_id = Some(AssessmentId::new(parsed));
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { api, assessment_id })
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // No subcommand launches the desktop UI.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Ui,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Ui,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    tracing::debug!(base_url = %parsed.api.base_url, ?cmd, "starting");
    let app_services = AppServices::http(
        parsed.api,
        Clock::default_clock(),
        SessionSettings::default(),
    );

    match cmd {
        Command::Ui => {
            let app: Arc<dyn UiApp> = Arc::new(app_services);
            let context = build_app_context(&app);

            // On macOS, Dioxus/tao can default to an always-on-top window in some dev setups.
            let desktop_cfg = DesktopConfig::new().with_window(
                WindowBuilder::new()
                    .with_title("Assessments")
                    .with_always_on_top(false),
            );

            LaunchBuilder::desktop()
                .with_cfg(desktop_cfg)
                .with_context(context)
                .launch(App);
            Ok(())
        }
        Command::Configs => {
            let configs = app_services.catalog().list_configs().await?;
            for config in configs {
                println!("{}\t{}", config.id, config.name);
            }
            Ok(())
        }
        Command::Results => {
            let rows = app_services.results().history().await?;
            for row in rows {
                println!(
                    "{}\t{}\t{}\t{}",
                    row.assessment_id,
                    row.assessment_name,
                    row.status.label(),
                    row.percentage.as_deref().unwrap_or("-"),
                );
            }
            Ok(())
        }
        Command::Report => {
            let assessment_id = parsed
                .assessment_id
                .ok_or(ArgsError::MissingAssessmentId)?;
            let report = app_services.results().report(assessment_id).await?;
            match report.body {
                Some(body) => {
                    println!("{} ({})", body.assessment_name, report.status.label());
                    println!("score: {}", body.score);
                    for category in body.categories {
                        println!("  {}: {}", category.category, category.score);
                    }
                    if !body.feedback.is_empty() {
                        println!();
                        println!("{}", body.feedback);
                    }
                }
                None => println!("report not ready ({})", report.status.label()),
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

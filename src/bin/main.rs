//! simplereports CLI - Run a YAML report and write its result file
//!
//! Usage:
//!   simplereports [-v <level>] [-c <settings.toml>] <report.yaml>
//!
//! Examples:
//!   simplereports customers.yaml
//!   simplereports -v debug customers.yaml
//!   RUST_LOG=simplereports=trace simplereports customers.yaml

use clap::{Parser, ValueEnum};
use simplereports::config::{Settings, SettingsError};
use simplereports::Report;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "simplereports")]
#[command(about = "Generate CSV, JSON or XML files from SQL queries described in YAML")]
#[command(version)]
struct Cli {
    /// Path to the report description (.yaml)
    file: PathBuf,

    /// Log level (defaults to the settings file, else warning)
    #[arg(short, long, value_enum)]
    verbose: Option<LogLevel>,

    /// Settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error | LogLevel::Critical => "error",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_ref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading settings: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let level = cli.verbose.unwrap_or_else(|| settings_level(&settings));
    init_logging(level);

    run(&cli.file, &settings)
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings, SettingsError> {
    match path {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    }
}

fn settings_level(settings: &Settings) -> LogLevel {
    match settings.logging.level.as_deref() {
        Some(level) => LogLevel::from_str(level, true).unwrap_or_else(|_| {
            eprintln!("Warning: unknown log level '{}', using warning", level);
            LogLevel::Warning
        }),
        None => LogLevel::Warning,
    }
}

fn init_logging(level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run(file: &Path, settings: &Settings) -> ExitCode {
    let report = match Report::from_path(file) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    let mut report = report
        .with_output_options(settings.output_options())
        .with_resolve_options(settings.resolve_options());

    // The report logs its own failures.
    let outcome = report
        .parse()
        .and_then(|()| report.connect())
        .and_then(|()| report.execute());

    match outcome {
        Ok(summary) => {
            tracing::info!(
                report = %summary.report,
                rows = summary.rows,
                "wrote {}",
                summary.path
            );
            ExitCode::SUCCESS
        }
        Err(_) => ExitCode::FAILURE,
    }
}

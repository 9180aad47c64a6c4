//! `cvforge` command-line entry point.
//!
//! # Responsibility
//! - Expose the core engine flows over JSON files.
//! - Print results as pretty JSON on stdout and failures as one
//!   `error code=<CODE> message=<...>` line on stderr.

use clap::{Parser, Subcommand};
use cvforge_core::{
    apply_operations, apply_resume_patch, default_styles, empty_content, init_logging,
    parse_operations, parse_patch_request, unzip, validate, zip, ConfigError, EngineConfig,
    EngineError, LoggingError, ResumePatchTarget, UuidIdGenerator,
};
use log::info;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const DEFAULT_PATCH_CONTENT_TYPE: &str = "application/json-patch+json";

/// Resume document patch and view-composition engine
#[derive(Parser, Debug)]
#[command(name = "cvforge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Engine config file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write rolling logs into this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Log level, overrides the config file
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print an empty content document
    Empty,

    /// Print the view composed from a content document
    View {
        content: PathBuf,

        /// Style document; library defaults when omitted
        #[arg(long)]
        styles: Option<PathBuf>,
    },

    /// Split a view into content and styles
    Unzip { view: PathBuf },

    /// Apply an operation batch to a content document
    Apply { content: PathBuf, operations: PathBuf },

    /// Apply a patch list to a resume record
    Patch {
        record: PathBuf,
        patch: PathBuf,

        #[arg(long, default_value = DEFAULT_PATCH_CONTENT_TYPE)]
        content_type: String,
    },

    /// Print the validation report of a content document
    Validate { content: PathBuf },
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::View { .. } => "view",
            Self::Unzip { .. } => "unzip",
            Self::Apply { .. } => "apply",
            Self::Patch { .. } => "patch",
            Self::Validate { .. } => "validate",
        }
    }
}

#[derive(Debug)]
enum CliError {
    Io { path: PathBuf, source: std::io::Error },
    Json { path: PathBuf, source: serde_json::Error },
    Config(ConfigError),
    Logging(LoggingError),
    Engine(EngineError),
    Invalid(usize),
}

impl CliError {
    fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "IO",
            Self::Json { .. } => "INVALID_JSON",
            Self::Config(_) => "CONFIG",
            Self::Logging(_) => "LOGGING",
            Self::Engine(err) => err.code(),
            Self::Invalid(_) => "VALIDATION",
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Io { path, source } => format!("cannot read `{}`: {source}", path.display()),
            Self::Json { path, source } => format!("`{}` is not valid JSON: {source}", path.display()),
            Self::Config(err) => err.to_string(),
            Self::Logging(err) => err.to_string(),
            Self::Engine(err) => err.to_string(),
            Self::Invalid(count) => format!("document has {count} validation issue(s)"),
        }
    }
}

impl From<EngineError> for CliError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error code={} message={}", err.code(), err.message());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path).map_err(CliError::Config)?,
        None => EngineConfig::default(),
    };
    if let Some(dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or_else(|| config.log_level());
        init_logging(level, dir).map_err(CliError::Logging)?;
    }
    info!(
        "event=cli_command module=cli status=start command={}",
        cli.command.name()
    );

    match cli.command {
        Command::Empty => print_json(&empty_content()),
        Command::View { content, styles } => {
            let content = read_json(&content)?;
            let styles = match styles {
                Some(path) => read_json(&path)?,
                None => default_styles(),
            };
            print_json(&zip(&content, &styles))
        }
        Command::Unzip { view } => {
            let unzipped = unzip(&read_json(&view)?);
            print_json(&serde_json::json!({
                "content": unzipped.content,
                "styles": unzipped.styles,
            }))
        }
        Command::Apply {
            content,
            operations,
        } => {
            let content = read_json(&content)?;
            let operations = parse_operations(&read_json(&operations)?)?;
            let applied = apply_operations(&content, &operations, &mut UuidIdGenerator)?;
            print_json(&applied)
        }
        Command::Patch {
            record,
            patch,
            content_type,
        } => {
            let target: ResumePatchTarget =
                serde_json::from_value(read_json(&record)?).map_err(|source| CliError::Json {
                    path: record.clone(),
                    source,
                })?;
            let body = read_text(&patch)?;
            let patch = parse_patch_request(Some(&content_type), &body)?;
            let outcome = apply_resume_patch(&target, &patch, &mut UuidIdGenerator, config.layout)?;
            print_json(&outcome.target)
        }
        Command::Validate { content } => {
            let report = validate(&read_json(&content)?);
            print_json(&report)?;
            if report.ok {
                Ok(())
            } else {
                Err(CliError::Invalid(report.issues.len()))
            }
        }
    }
}

fn read_text(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json(path: &Path) -> Result<Value, CliError> {
    serde_json::from_str(&read_text(path)?).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn print_json(value: &impl serde::Serialize) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value).map_err(|source| CliError::Json {
        path: PathBuf::from("<stdout>"),
        source,
    })?;
    println!("{rendered}");
    Ok(())
}

// gradecheck CLI - compare roster grades against downloaded grade exports

mod compare;
mod exit_codes;
mod merge;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use exit_codes::{EXIT_INVALID_CONFIG, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "gradecheck")]
#[command(about = "Compare course roster grades against downloaded grade exports")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare rosters with downloaded exports, course by course
    #[command(after_help = "\
Rosters and downloaded exports are paired by file name without extension:
MATH101.xlsx is compared with MATH101.csv. Directories are scanned (not
recursively) for roster spreadsheets and downloaded CSV files.

Exit code 1 (with --strict) means at least one mismatch was found.
Exit code 7 means no course could be compared at all.

Examples:
  gradecheck compare --roster rosters/ --downloaded exports/
  gradecheck compare --roster MATH101.xlsx --downloaded MATH101.csv --json
  gradecheck compare --roster rosters/ --downloaded merged/ --out results/ --zip
  gradecheck compare --roster rosters/ --downloaded exports/ --config recon.toml --strict")]
    Compare(compare::CompareArgs),

    /// Extract a zip of per-section exports and merge them per course
    #[command(after_help = "\
Files are grouped by course code: MATH101_1.csv and MATH101_2.xlsx are merged
into MATH101.csv. The output directory can be passed to `compare --downloaded`.

Examples:
  gradecheck merge exports.zip --out merged/
  gradecheck merge exports.zip --out merged/ --zip")]
    Merge {
        /// Zip archive holding the section files
        archive: PathBuf,

        /// Directory for the merged per-course CSV files
        #[arg(long)]
        out: PathBuf,

        /// Also package the merged files as merged_files.zip
        #[arg(long)]
        zip: bool,

        /// Print the merge report as JSON to stdout
        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\ntarget:  ", env!("TARGET"),
    )
}

fn init_logging() {
    // Logs go to stderr; stdout is reserved for --json output
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gradecheck=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let result = match cli.command {
        Commands::Compare(args) => compare::cmd_compare(args),
        Commands::Merge { archive, out, zip, json } => merge::cmd_merge(archive, out, zip, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_IO, msg)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(EXIT_INVALID_CONFIG, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

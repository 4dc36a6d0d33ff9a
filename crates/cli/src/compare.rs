//! `gradecheck compare` — roster vs downloaded grade comparison.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;

use gradecheck_io::export::{package_files, write_report, RESULTS_ARCHIVE};
use gradecheck_io::source::{extension_of, FileSource};
use gradecheck_recon::{BatchReport, CourseStatus, ReconConfig, ReconError};

use crate::exit_codes::{EXIT_ALL_FAILED, EXIT_MISMATCH};
use crate::CliError;

/// Extensions picked up when a roster argument is a directory.
const ROSTER_SCAN: &[&str] = &["xlsx", "xls", "xlsm", "ods", "csv"];

/// Extensions picked up when a downloaded argument is a directory.
const DOWNLOADED_SCAN: &[&str] = &["csv"];

#[derive(Args)]
pub struct CompareArgs {
    /// Roster file or directory of rosters (repeatable)
    #[arg(long, required = true, num_args = 1..)]
    roster: Vec<PathBuf>,

    /// Downloaded export file or directory of exports (repeatable)
    #[arg(long, required = true, num_args = 1..)]
    downloaded: Vec<PathBuf>,

    /// Comparison settings (TOML). Defaults to <config dir>/gradecheck/recon.toml if present
    #[arg(long, env = "GRADECHECK_CONFIG")]
    config: Option<PathBuf>,

    /// Write result CSVs and summary.json into this directory
    #[arg(long)]
    out: Option<PathBuf>,

    /// Also package the written results as comparison_results.zip (requires --out)
    #[arg(long, requires = "out")]
    zip: bool,

    /// Print the full report as JSON to stdout
    #[arg(long)]
    json: bool,

    /// Exit 1 when any mismatch is found
    #[arg(long)]
    strict: bool,
}

pub fn cmd_compare(args: CompareArgs) -> Result<(), CliError> {
    let config = load_config(args.config.as_deref())?;

    let rosters = collect_inputs(&args.roster, ROSTER_SCAN)?;
    let downloads = collect_inputs(&args.downloaded, DOWNLOADED_SCAN)?;
    if rosters.is_empty() {
        return Err(CliError::args("no roster files found")
            .with_hint(format!("supported roster types: {}", ROSTER_SCAN.join(", "))));
    }
    if downloads.is_empty() {
        return Err(CliError::args("no downloaded files found")
            .with_hint("downloaded exports are read from .csv files"));
    }
    tracing::debug!("{} roster(s), {} downloaded file(s)", rosters.len(), downloads.len());

    let rosters: Vec<FileSource> = rosters.into_iter().map(FileSource::new).collect();
    let downloads: Vec<FileSource> = downloads.into_iter().map(FileSource::new).collect();

    let report = gradecheck_recon::run(&rosters, &downloads, &config);

    if let Some(ref dir) = args.out {
        let written = write_report(&report, dir).map_err(CliError::io)?;
        if args.zip {
            let zip_path = dir.join(RESULTS_ARCHIVE);
            package_files(&written, &zip_path).map_err(CliError::io)?;
            eprintln!("wrote {}", zip_path.display());
        } else {
            eprintln!("wrote results to {}", dir.display());
        }
    }

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{json}");
    }

    print_summary(&report);
    verdict(&report, args.strict)
}

/// Exit status of a finished run.
fn verdict(report: &BatchReport, strict: bool) -> Result<(), CliError> {
    let s = &report.summary;
    if !report.outcomes.is_empty() && s.failed_courses == report.outcomes.len() {
        return Err(CliError::new(EXIT_ALL_FAILED, "no course could be compared"));
    }
    if strict && s.total_mismatches > 0 {
        return Err(CliError::new(
            EXIT_MISMATCH,
            format!("{} mismatches found", s.total_mismatches),
        ));
    }
    Ok(())
}

fn print_summary(report: &BatchReport) {
    for outcome in &report.outcomes {
        match outcome.status {
            CourseStatus::Success => eprintln!("  {}: {}", outcome.course, outcome.message),
            CourseStatus::Error => eprintln!("  {}: error: {}", outcome.course, outcome.message),
        }
    }
    for name in &report.unpaired_downloads {
        eprintln!("  {name}: no roster with this name, skipped");
    }

    let s = &report.summary;
    eprintln!(
        "{} courses: {} students ({} unique), {} mismatches in {} courses, {} withdrawn, {} failed",
        s.total_courses,
        s.total_students,
        s.unique_students,
        s.total_mismatches,
        s.courses_with_mismatches,
        s.withdrawn_students,
        s.failed_courses,
    );
}

/// `--config` if given, else the per-user config file if it exists, else defaults.
fn load_config(explicit: Option<&Path>) -> Result<ReconConfig, CliError> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match default_config_path().filter(|p| p.exists()) {
            Some(p) => p,
            None => return Ok(ReconConfig::default()),
        },
    };

    let config = ReconConfig::load(&path).map_err(|e| match e {
        ReconError::Io(msg) => CliError::io(msg),
        other => CliError::config(format!("{}: {other}", path.display())),
    })?;
    tracing::info!("using config {}", path.display());
    Ok(config)
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("gradecheck").join("recon.toml"))
}

/// Expand each argument: files are taken as given, directories are scanned
/// one level deep for `extensions`, sorted by name.
fn collect_inputs(args: &[PathBuf], extensions: &[&str]) -> Result<Vec<PathBuf>, CliError> {
    let mut files = Vec::new();
    for arg in args {
        if arg.is_dir() {
            let mut found: Vec<PathBuf> = fs::read_dir(arg)
                .map_err(|e| CliError::io(format!("cannot read {}: {e}", arg.display())))?
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && extensions.contains(&extension_of(p).as_str()))
                .collect();
            found.sort();
            files.extend(found);
        } else if arg.is_file() {
            files.push(arg.clone());
        } else {
            return Err(CliError::io(format!("{}: no such file or directory", arg.display())));
        }
    }
    Ok(files)
}

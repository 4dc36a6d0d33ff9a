//! `gradecheck merge` — extract a zip of section exports, one CSV per course.

use std::path::PathBuf;

use gradecheck_io::export::{package_files, MERGED_ARCHIVE};
use gradecheck_io::extract_and_merge;

use crate::CliError;

pub fn cmd_merge(archive: PathBuf, out: PathBuf, zip: bool, json: bool) -> Result<(), CliError> {
    if !archive.is_file() {
        return Err(CliError::io(format!("{}: no such file", archive.display())));
    }

    let report = extract_and_merge(&archive, &out).map_err(|e| {
        CliError::io(e).with_hint("the archive must be a zip of .csv/.xlsx/.xls files")
    })?;

    for file in &report.processed {
        eprintln!("  {} -> {}", file.file, file.course);
    }
    for file in &report.skipped {
        eprintln!("  {}: skipped ({})", file.file, file.reason);
    }
    for course in &report.merged {
        eprintln!(
            "merged {} file(s) into {} ({} rows)",
            course.files,
            course.path.display(),
            course.rows
        );
    }

    if zip && !report.merged.is_empty() {
        let zip_path = out.join(MERGED_ARCHIVE);
        let merged: Vec<PathBuf> = report.merged.iter().map(|m| m.path.clone()).collect();
        package_files(&merged, &zip_path).map_err(CliError::io)?;
        eprintln!("wrote {}", zip_path.display());
    }

    if json {
        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{text}");
    }

    if report.merged.is_empty() {
        return Err(CliError::args(format!("no grade files found in {}", archive.display()))
            .with_hint("expected .csv, .xlsx or .xls files named like MATH101_1.csv"));
    }
    Ok(())
}

// Result export: CSV tables + JSON summary, optional zip packaging.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use gradecheck_recon::{BatchReport, ReconciledRow};

pub const ALL_RESULTS_FILE: &str = "all_results.csv";
pub const ALL_MISMATCHES_FILE: &str = "all_mismatches.csv";
pub const SUMMARY_FILE: &str = "summary.json";
pub const RESULTS_ARCHIVE: &str = "comparison_results.zip";
pub const MERGED_ARCHIVE: &str = "merged_files.zip";

const COLUMNS: &[&str] = &[
    "course",
    "student_id",
    "roster_grade",
    "downloaded_grade",
    "matched",
    "is_withdrawn",
    "join_origin",
];

/// Write the report files into `output_dir` and return their paths in
/// write order. Combined tables are skipped when they would be empty.
pub fn write_report(report: &BatchReport, output_dir: &Path) -> Result<Vec<PathBuf>, String> {
    fs::create_dir_all(output_dir)
        .map_err(|e| format!("cannot create {}: {e}", output_dir.display()))?;
    let mut written = Vec::new();

    let all: Vec<&ReconciledRow> = report.all_rows().collect();
    if !all.is_empty() {
        written.push(write_table(&output_dir.join(ALL_RESULTS_FILE), &all)?);
    }

    let mismatches: Vec<&ReconciledRow> = report.all_unmatched().collect();
    if !mismatches.is_empty() {
        written.push(write_table(&output_dir.join(ALL_MISMATCHES_FILE), &mismatches)?);
    }

    for outcome in report.successful() {
        let rows: Vec<&ReconciledRow> = outcome.rows().iter().collect();
        let path = output_dir.join(format!("{}_comparison.csv", outcome.course));
        written.push(write_table(&path, &rows)?);
    }

    let summary_path = output_dir.join(SUMMARY_FILE);
    let json = serde_json::to_string_pretty(report).map_err(|e| e.to_string())?;
    fs::write(&summary_path, json)
        .map_err(|e| format!("cannot write {}: {e}", summary_path.display()))?;
    written.push(summary_path);

    log::info!("wrote {} report file(s) to {}", written.len(), output_dir.display());
    Ok(written)
}

fn write_table(path: &Path, rows: &[&ReconciledRow]) -> Result<PathBuf, String> {
    let headers: Vec<String> = COLUMNS.iter().map(|c| c.to_string()).collect();
    let cells: Vec<Vec<String>> = rows.iter().map(|r| row_cells(r)).collect();
    crate::csv::write_rows(path, &headers, &cells)?;
    Ok(path.to_path_buf())
}

fn row_cells(row: &ReconciledRow) -> Vec<String> {
    vec![
        row.course.clone(),
        row.student_id.clone(),
        row.roster_grade.clone(),
        row.downloaded_grade.clone(),
        row.matched.to_string(),
        row.is_withdrawn.to_string(),
        row.join_origin.to_string(),
    ]
}

/// Zip `files` (deflate, stored under their file names, in the given order)
/// into `zip_path`. Callers pass the paths they wrote, so leftovers from
/// earlier runs in the same directory are never packaged.
pub fn package_files(files: &[PathBuf], zip_path: &Path) -> Result<usize, String> {
    let file = fs::File::create(zip_path)
        .map_err(|e| format!("cannot create {}: {e}", zip_path.display()))?;
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| format!("{}: not a file path", path.display()))?;
        let bytes = fs::read(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        zip.start_file(name, options).map_err(|e| e.to_string())?;
        zip.write_all(&bytes).map_err(|e| e.to_string())?;
    }
    zip.finish().map_err(|e| e.to_string())?;

    log::info!("packaged {} file(s) into {}", files.len(), zip_path.display());
    Ok(files.len())
}

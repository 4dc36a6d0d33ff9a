// Archive extraction + merge of per-section grade files into one CSV per course.
//
//   MATH101_1.csv, MATH101_2.xlsx  =>  MATH101.csv
//   CSAI330_1.xlsx, CSAI330_2.csv  =>  CSAI330.csv
//
// The merged directory is usable directly as the downloaded-file input of a
// comparison run.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use gradecheck_recon::Table;
use regex::Regex;
use serde::Serialize;

use crate::source::{extension_of, read_grid};

/// Extensions picked up from the archive.
const MERGE_EXTENSIONS: &[&str] = &["csv", "xlsx", "xls"];

#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeReport {
    /// `file -> course code`, in walk order.
    pub processed: Vec<ProcessedFile>,
    /// One entry per written course file, first-seen order.
    pub merged: Vec<MergedCourse>,
    /// Files that matched an extension but could not be read.
    pub skipped: Vec<SkippedFile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessedFile {
    pub file: String,
    pub course: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct MergedCourse {
    pub course: String,
    pub files: usize,
    pub rows: usize,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub file: String,
    pub reason: String,
}

/// Course code of a file stem: `CSAI330_1` -> `CSAI330`. Stems that do not
/// look like a code are used whole.
pub fn course_code(stem: &str) -> String {
    static CODE: OnceLock<Regex> = OnceLock::new();
    let re = CODE.get_or_init(|| {
        Regex::new(r"(?i)^([A-Za-z0-9]+\d+)(?:_.*)?$").expect("course code pattern is valid")
    });
    re.captures(stem)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_else(|| stem.to_string())
}

/// Extract `archive_path` into a scoped temporary directory and merge its
/// grade files into `output_dir`. The temporary directory is removed on
/// every exit path.
pub fn extract_and_merge(archive_path: &Path, output_dir: &Path) -> Result<MergeReport, String> {
    fs::create_dir_all(output_dir)
        .map_err(|e| format!("cannot create {}: {e}", output_dir.display()))?;

    let staging = tempfile::Builder::new()
        .prefix("gradecheck-extract-")
        .tempdir()
        .map_err(|e| format!("cannot create extraction directory: {e}"))?;

    let file = fs::File::open(archive_path)
        .map_err(|e| format!("cannot open {}: {e}", archive_path.display()))?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| format!("{}: {e}", archive_path.display()))?;
    archive
        .extract(staging.path())
        .map_err(|e| format!("cannot extract {}: {e}", archive_path.display()))?;
    log::info!("extracted {} entries from {}", archive.len(), archive_path.display());

    merge_directory(staging.path(), output_dir)
}

/// Merge every grade file under `input_dir` (recursively) by course code.
pub fn merge_directory(input_dir: &Path, output_dir: &Path) -> Result<MergeReport, String> {
    let mut report = MergeReport::default();
    let mut courses: Vec<(String, Vec<Table>)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for path in walk_files(input_dir)? {
        if !MERGE_EXTENSIONS.contains(&extension_of(&path).as_str()) {
            continue;
        }
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let course = course_code(&stem);

        report.processed.push(ProcessedFile { file: file.clone(), course: course.clone() });

        match read_grid(&path) {
            Ok(grid) => {
                let slot = *index.entry(course.clone()).or_insert_with(|| {
                    courses.push((course.clone(), Vec::new()));
                    courses.len() - 1
                });
                courses[slot].1.push(Table::from_grid(grid, 0));
            }
            Err(reason) => {
                log::warn!("couldn't read {file}: {reason}");
                report.skipped.push(SkippedFile { file, reason });
            }
        }
    }

    for (course, tables) in courses {
        let (headers, rows) = concat_tables(&tables);
        let path = output_dir.join(format!("{course}.csv"));
        crate::csv::write_rows(&path, &headers, &rows)?;
        log::info!("{course}: {} file(s) merged, {} rows", tables.len(), rows.len());
        report.merged.push(MergedCourse {
            course,
            files: tables.len(),
            rows: rows.len(),
            path,
        });
    }

    Ok(report)
}

/// Stack tables vertically. Columns are the union of all headers in
/// first-seen order; cells a table lacks are empty. Blank rows are dropped.
pub fn concat_tables(tables: &[Table]) -> (Vec<String>, Vec<Vec<String>>) {
    let mut headers: Vec<String> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut mapped: Vec<Vec<usize>> = Vec::with_capacity(tables.len());

    for table in tables {
        let mut table_map = Vec::with_capacity(table.headers.len());
        for label in column_labels(&table.headers) {
            let pos = *positions.entry(label.clone()).or_insert_with(|| {
                headers.push(label);
                headers.len() - 1
            });
            table_map.push(pos);
        }
        mapped.push(table_map);
    }

    let mut rows = Vec::new();
    for (table, table_map) in tables.iter().zip(&mapped) {
        for source in &table.rows {
            if source.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            let mut row = vec![String::new(); headers.len()];
            for (col, &pos) in table_map.iter().enumerate() {
                if let Some(value) = source.get(col) {
                    row[pos] = value.clone();
                }
            }
            rows.push(row);
        }
    }

    (headers, rows)
}

/// Unique labels for one table's header row: blanks become `Unnamed: N`,
/// repeats get a `.N` suffix.
fn column_labels(headers: &[String]) -> Vec<String> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if h.is_empty() {
                return format!("Unnamed: {i}");
            }
            let count = seen.entry(h.as_str()).or_insert(0);
            let label = if *count == 0 { h.clone() } else { format!("{h}.{count}") };
            *count += 1;
            label
        })
        .collect()
}

/// Files under `dir`, depth-first, entries sorted by name.
fn walk_files(dir: &Path) -> Result<Vec<PathBuf>, String> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| format!("cannot read {}: {e}", dir.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .collect();
    entries.sort();

    let mut files = Vec::new();
    for path in entries {
        if path.is_dir() {
            files.extend(walk_files(&path)?);
        } else {
            files.push(path);
        }
    }
    Ok(files)
}

// CSV/TSV reading into raw grids, CSV writing of tables

use std::collections::HashMap;
use std::path::Path;

use gradecheck_recon::RawGrid;

pub fn read_grid(path: &Path) -> Result<RawGrid, String> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    grid_from_str(&content, delimiter)
}

const DELIMITERS: &[u8] = &[b'\t', b';', b',', b'|'];

/// Non-blank lines inspected by [`sniff_delimiter`].
const SNIFF_LINES: usize = 20;

/// Pick the field delimiter from the first non-blank lines.
///
/// Rosters often open with single-cell title rows, so no single line decides.
/// Each candidate is scored on its most common multi-field width: width times
/// the number of lines that have it. Falls back to `,`.
fn sniff_delimiter(content: &str) -> u8 {
    let sample: Vec<&str> = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();

    let mut best = (b',', 0usize);
    for &delim in DELIMITERS {
        let mut widths: HashMap<usize, usize> = HashMap::new();
        for line in &sample {
            let width = field_count(line, delim);
            if width > 1 {
                *widths.entry(width).or_insert(0) += 1;
            }
        }
        // wider rows win a tie on line count
        let Some((width, lines)) = widths.into_iter().max_by_key(|&(w, n)| (n, w)) else {
            continue;
        };
        if width * lines > best.1 {
            best = (delim, width * lines);
        }
    }
    best.0
}

/// Fields in one line under `delim`, honouring quotes.
fn field_count(line: &str, delim: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delim)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(|r| r.ok())
        .map_or(1, |r| r.len())
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// File contents as text. Invalid UTF-8 is decoded as Windows-1252, the code
/// page Excel uses for "CSV" exports on Windows. A leading BOM is dropped.
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let bytes = std::fs::read(path).map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes);
    Ok(match std::str::from_utf8(body) {
        Ok(text) => text.to_string(),
        Err(_) => encoding_rs::WINDOWS_1252.decode_without_bom_handling(body).0.into_owned(),
    })
}

fn grid_from_str(content: &str, delimiter: u8) -> Result<RawGrid, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| e.to_string())?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(RawGrid::new(rows))
}

/// Write a header row plus data rows as comma-separated values.
pub fn write_rows(path: &Path, headers: &[String], rows: &[Vec<String>]) -> Result<(), String> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| e.to_string())?;

    writer.write_record(headers).map_err(|e| e.to_string())?;
    for row in rows {
        writer.write_record(row).map_err(|e| e.to_string())?;
    }

    writer.flush().map_err(|e| e.to_string())?;
    Ok(())
}

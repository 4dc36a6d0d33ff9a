// Excel roster import (xlsx, xls, xlsm, xlsb, ods) into a raw grid.
//
// Only the first worksheet is read. Cell values are rendered as display
// strings; no formatting or formulas are carried over.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};
use gradecheck_recon::RawGrid;

pub fn read_grid(path: &Path) -> Result<RawGrid, String> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| format!("Failed to open Excel file: {}", e))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| "Excel file contains no sheets".to_string())?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| format!("Failed to read sheet '{}': {}", sheet_name, e))?;

    // Range start offset (data may not begin at A1). Leading blank rows and
    // columns are kept so header indices match what the user sees.
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let mut rows: Vec<Vec<String>> = vec![Vec::new(); start_row as usize];

    for row in range.rows() {
        let mut cells = vec![String::new(); start_col as usize];
        cells.extend(row.iter().map(render_cell));
        rows.push(cells);
    }

    log::debug!("{}: read {} rows from sheet '{}'", path.display(), rows.len(), sheet_name);
    Ok(RawGrid::new(rows))
}

/// Display string of one cell.
fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => {
            // Integers without decimals: numeric SIDs must not read as "100.0"
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        Data::Int(n) => format!("{}", n),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::Error(e) => format!("#{:?}", e),
        Data::DateTime(dt) => format!("{}", dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

use std::collections::HashSet;

use crate::config::HeaderConfig;
use crate::error::CourseError;
use crate::table::{RawGrid, Table};

/// Index of the first row that carries the grade marker and at least one
/// identifier marker. Cells are uppercased and trimmed before comparison.
pub fn locate_header(grid: &RawGrid, markers: &HeaderConfig) -> Option<usize> {
    grid.rows.iter().position(|row| {
        let tokens: HashSet<String> = row.iter().map(|c| c.trim().to_uppercase()).collect();
        tokens.contains(&markers.grade_marker)
            && markers.id_markers.iter().any(|m| tokens.contains(m))
    })
}

/// Locate the header row of a roster grid and materialize the table below it.
/// `source` names the file in the `HeaderNotFound` message.
pub fn read_roster_table(
    grid: RawGrid,
    markers: &HeaderConfig,
    source: &str,
) -> Result<Table, CourseError> {
    let index = locate_header(&grid, markers).ok_or_else(|| CourseError::HeaderNotFound {
        source: source.to_string(),
    })?;
    log::debug!("{source}: header row at index {index}");
    Ok(Table::from_grid(grid, index))
}

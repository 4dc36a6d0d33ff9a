//! Two-phase table model: a sheet is first peeked as a [`RawGrid`] with no
//! header assumption, then materialized into a [`Table`] once the header row
//! index is known.

/// Cells exactly as read, row-major. Rows may have different lengths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawGrid {
    pub rows: Vec<Vec<String>>,
}

impl RawGrid {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<Vec<Vec<&str>>> for RawGrid {
    fn from(rows: Vec<Vec<&str>>) -> Self {
        Self {
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(str::to_string).collect())
                .collect(),
        }
    }
}

/// A grid with named fields. Header labels are whitespace-trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Use row `header_index` as field names and every later row as data.
    /// An index past the end yields an empty table.
    pub fn from_grid(grid: RawGrid, header_index: usize) -> Self {
        let mut rows = grid.rows.into_iter().skip(header_index);
        let headers = rows
            .next()
            .map(|h| h.iter().map(|c| c.trim().to_string()).collect())
            .unwrap_or_default();
        Self {
            headers,
            rows: rows.collect(),
        }
    }

    /// Index of the first column whose trimmed label equals `label`.
    pub fn column(&self, label: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == label)
    }

    /// Cell at (`row`, `col`); missing cells in short rows read as empty.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

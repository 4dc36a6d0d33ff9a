use std::path::Path;

use crate::table::RawGrid;

/// A named tabular input that can be peeked as a raw grid.
///
/// The engine never touches file formats; readers live in the IO crate.
pub trait GridSource {
    /// Upload or file name, extension included.
    fn name(&self) -> &str;

    /// Read every cell, no header assumption.
    fn read_grid(&self) -> Result<RawGrid, String>;

    /// Course identity: the name with its extension stripped.
    fn course_name(&self) -> String {
        course_name(self.name())
    }
}

/// File stem of `name`. Case is preserved; only the last extension goes.
pub fn course_name(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string())
}

/// A grid already in memory. Used by callers that read tables themselves.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    pub name: String,
    pub grid: RawGrid,
}

impl InMemorySource {
    pub fn new(name: impl Into<String>, grid: RawGrid) -> Self {
        Self { name: name.into(), grid }
    }
}

impl GridSource for InMemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_grid(&self) -> Result<RawGrid, String> {
        Ok(self.grid.clone())
    }
}

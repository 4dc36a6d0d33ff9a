// Grid sources backed by files on disk or by uploaded bytes.

use std::io::Write;
use std::path::{Path, PathBuf};

use gradecheck_recon::{GridSource, RawGrid};

/// Extensions read through calamine.
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xls", "xlsm", "xlsb", "ods"];

/// Read any supported file as a raw grid, dispatching on extension.
pub fn read_grid(path: &Path) -> Result<RawGrid, String> {
    let ext = extension_of(path);
    match ext.as_str() {
        "csv" | "tsv" | "txt" => crate::csv::read_grid(path),
        e if SPREADSHEET_EXTENSIONS.contains(&e) => crate::xlsx::read_grid(path),
        "" => Err(format!("{}: missing file extension", path.display())),
        other => Err(format!("{}: unsupported file type '.{other}'", path.display())),
    }
}

/// Lowercased extension, or empty.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// File on disk
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FileSource {
    pub path: PathBuf,
    name: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }
}

impl GridSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_grid(&self) -> Result<RawGrid, String> {
        read_grid(&self.path)
    }
}

// ---------------------------------------------------------------------------
// Uploaded bytes
// ---------------------------------------------------------------------------

/// An upload held in memory. Readers need a real file, so reads stage the
/// bytes into a temporary file that is removed before `read_grid` returns.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), bytes }
    }
}

impl GridSource for UploadedFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_grid(&self) -> Result<RawGrid, String> {
        let suffix = format!(".{}", extension_of(Path::new(&self.name)));
        with_staged_file(&self.bytes, &suffix, read_grid)
    }
}

/// Write `bytes` to a temporary file ending in `suffix`, run `f` on its path,
/// and delete the file on every exit path.
pub fn with_staged_file<T>(
    bytes: &[u8],
    suffix: &str,
    f: impl FnOnce(&Path) -> Result<T, String>,
) -> Result<T, String> {
    let mut staged = tempfile::Builder::new()
        .prefix("gradecheck-")
        .suffix(suffix)
        .tempfile()
        .map_err(|e| format!("cannot stage upload: {e}"))?;
    staged
        .write_all(bytes)
        .and_then(|_| staged.flush())
        .map_err(|e| format!("cannot stage upload: {e}"))?;

    let result = f(staged.path());
    staged
        .close()
        .map_err(|e| format!("cannot remove staged upload: {e}"))?;
    result
}

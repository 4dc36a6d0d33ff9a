use std::fmt;

/// Run-level failure. Raised before any course is processed (config) or while
/// writing results, never from inside a course.
#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty marker, empty column label, etc.).
    ConfigValidation(String),
    /// IO error (file read/write, archive packaging).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}

/// Which required column a course was missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissingColumn {
    /// None of the accepted roster identifier labels is present.
    RosterId,
    /// The roster grade column (label carried for the message).
    RosterGrade(String),
    /// Identifier or approved-grade column absent from the downloaded table.
    Downloaded,
}

/// Course-scoped failure. Downgrades exactly one course to `status: error`;
/// the batch always continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CourseError {
    /// No row of the roster grid carries the header markers.
    HeaderNotFound { source: String },
    MissingColumn(MissingColumn),
    /// Roster present, no downloaded table with the same course name.
    NoMatchingFile,
    /// Any read/parse failure of either table.
    ProcessingFailure(String),
}

impl fmt::Display for CourseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeaderNotFound { source } => {
                write!(f, "Header row with required keywords not found in {source}")
            }
            Self::MissingColumn(MissingColumn::RosterId) => {
                write!(f, "Required student id column is missing.")
            }
            Self::MissingColumn(MissingColumn::RosterGrade(label)) => {
                write!(f, "'{label}' column is missing.")
            }
            Self::MissingColumn(MissingColumn::Downloaded) => {
                write!(f, "Required columns are missing in downloaded file.")
            }
            Self::NoMatchingFile => write!(f, "No matching downloaded file found"),
            Self::ProcessingFailure(cause) => write!(f, "Error processing files: {cause}"),
        }
    }
}

impl std::error::Error for CourseError {}

use std::path::Path;

use serde::Deserialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Column labels, header markers and grade tokens used by a reconciliation run.
///
/// Every section is optional in TOML; an empty document yields the defaults,
/// which match the institutional roster and grading-portal export layouts.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    #[serde(default)]
    pub header: HeaderConfig,
    #[serde(default)]
    pub roster: RosterColumns,
    #[serde(default)]
    pub downloaded: DownloadedColumns,
    #[serde(default)]
    pub grades: GradeRules,
}

// ---------------------------------------------------------------------------
// Header markers
// ---------------------------------------------------------------------------

/// Tokens that identify the header row of a roster sheet.
/// Compared against uppercased, trimmed cells.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeaderConfig {
    pub grade_marker: String,
    pub id_markers: Vec<String>,
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            grade_marker: "LETTER GRADE".into(),
            id_markers: vec!["SID".into(), "STUDENT ID".into()],
        }
    }
}

// ---------------------------------------------------------------------------
// Column mapping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RosterColumns {
    /// Accepted identifier labels, tried in order.
    pub id_columns: Vec<String>,
    pub grade_column: String,
}

impl Default for RosterColumns {
    fn default() -> Self {
        Self {
            id_columns: vec!["SID".into(), "Student ID".into()],
            grade_column: "Letter Grade".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DownloadedColumns {
    pub id_column: String,
    pub grade_column: String,
    /// Optional in the data; synthesized as empty when absent.
    pub withdrawn_column: String,
}

impl Default for DownloadedColumns {
    fn default() -> Self {
        Self {
            id_column: "ID".into(),
            grade_column: "Approved final grade".into(),
            withdrawn_column: "Withdrawn".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Grade rules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GradeRules {
    /// Approved grade that marks a withdrawal.
    pub withdrawn_grade: String,
    /// Value of the withdrawn column that marks a withdrawal.
    pub withdrawn_flag: String,
    /// Downloaded grade an `ABSENT` roster entry must resolve to.
    pub absent_resolves_to: String,
}

impl Default for GradeRules {
    fn default() -> Self {
        Self {
            withdrawn_grade: "W".into(),
            withdrawn_flag: "WITHDRAWN".into(),
            absent_resolves_to: "F".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let mut config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        config.canonicalize();
        Ok(config)
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self, ReconError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ReconError::Io(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.header.grade_marker.trim().is_empty() {
            return Err(ReconError::ConfigValidation("header.grade_marker must not be empty".into()));
        }
        if self.header.id_markers.is_empty() {
            return Err(ReconError::ConfigValidation("header.id_markers must list at least one marker".into()));
        }
        if self.roster.id_columns.is_empty() {
            return Err(ReconError::ConfigValidation("roster.id_columns must list at least one label".into()));
        }

        let labels = self
            .header
            .id_markers
            .iter()
            .map(|m| ("header.id_markers", m))
            .chain(self.roster.id_columns.iter().map(|c| ("roster.id_columns", c)))
            .chain([
                ("roster.grade_column", &self.roster.grade_column),
                ("downloaded.id_column", &self.downloaded.id_column),
                ("downloaded.grade_column", &self.downloaded.grade_column),
                ("downloaded.withdrawn_column", &self.downloaded.withdrawn_column),
                ("grades.withdrawn_grade", &self.grades.withdrawn_grade),
                ("grades.withdrawn_flag", &self.grades.withdrawn_flag),
                ("grades.absent_resolves_to", &self.grades.absent_resolves_to),
            ]);
        for (field, value) in labels {
            if value.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!("{field} contains an empty value")));
            }
        }

        Ok(())
    }

    /// Markers and grade tokens are matched against uppercased, trimmed cells.
    fn canonicalize(&mut self) {
        let upper = |s: &mut String| *s = s.trim().to_uppercase();
        upper(&mut self.header.grade_marker);
        self.header.id_markers.iter_mut().for_each(upper);
        upper(&mut self.grades.withdrawn_grade);
        upper(&mut self.grades.withdrawn_flag);
        upper(&mut self.grades.absent_resolves_to);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

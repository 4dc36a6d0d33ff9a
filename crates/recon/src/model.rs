use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Input rows
// ---------------------------------------------------------------------------

/// One roster row after column extraction. Identifier is trimmed,
/// grade is trimmed and uppercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRow {
    pub student_id: String,
    pub letter_grade: String,
}

/// One downloaded-export row after column extraction. `withdrawn_flag` is
/// empty when the export has no withdrawn column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedRow {
    pub student_id: String,
    pub approved_grade: String,
    pub withdrawn_flag: String,
}

// ---------------------------------------------------------------------------
// Join output
// ---------------------------------------------------------------------------

/// Which side(s) of the outer join produced a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinOrigin {
    RosterOnly,
    DownloadedOnly,
    Both,
}

impl fmt::Display for JoinOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RosterOnly => write!(f, "roster_only"),
            Self::DownloadedOnly => write!(f, "downloaded_only"),
            Self::Both => write!(f, "both"),
        }
    }
}

/// One admitted student row of one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciledRow {
    pub course: String,
    pub student_id: String,
    pub roster_grade: String,
    pub downloaded_grade: String,
    pub matched: bool,
    pub is_withdrawn: bool,
    pub join_origin: JoinOrigin,
}

// ---------------------------------------------------------------------------
// Per-course outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    Success,
    Error,
}

impl fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseOutcome {
    pub course: String,
    pub status: CourseStatus,
    pub message: String,
    /// `None` for error outcomes.
    pub rows: Option<Vec<ReconciledRow>>,
    pub unmatched: Vec<ReconciledRow>,
    /// Identifiers of withdrawn rows, in row order.
    pub withdrawn_ids: Vec<String>,
}

impl CourseOutcome {
    pub fn success(course: &str, rows: Vec<ReconciledRow>) -> Self {
        let unmatched: Vec<ReconciledRow> = rows.iter().filter(|r| !r.matched).cloned().collect();
        let withdrawn_ids: Vec<String> = rows
            .iter()
            .filter(|r| r.is_withdrawn)
            .map(|r| r.student_id.clone())
            .collect();
        let message = format!(
            "Processed {} students, found {} mismatches, {} withdrawn",
            rows.len(),
            unmatched.len(),
            withdrawn_ids.len()
        );
        Self {
            course: course.to_string(),
            status: CourseStatus::Success,
            message,
            rows: Some(rows),
            unmatched,
            withdrawn_ids,
        }
    }

    pub fn error(course: &str, message: impl Into<String>) -> Self {
        Self {
            course: course.to_string(),
            status: CourseStatus::Error,
            message: message.into(),
            rows: None,
            unmatched: Vec::new(),
            withdrawn_ids: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CourseStatus::Success
    }

    /// Admitted rows; empty for error outcomes.
    pub fn rows(&self) -> &[ReconciledRow] {
        self.rows.as_deref().unwrap_or(&[])
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Paired courses attempted, including ones that later failed.
    pub total_courses: usize,
    pub courses_with_mismatches: usize,
    pub total_mismatches: usize,
    /// Admitted rows summed over courses; a student in two courses counts twice.
    pub total_students: usize,
    /// Distinct identifiers across all successful courses.
    pub unique_students: usize,
    /// Withdrawn rows summed over courses, not deduplicated.
    pub withdrawn_students: usize,
    /// Error outcomes, including unpaired rosters.
    pub failed_courses: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchMeta {
    pub engine_version: String,
    pub run_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub meta: BatchMeta,
    pub summary: BatchSummary,
    /// One per roster, in roster input order.
    pub outcomes: Vec<CourseOutcome>,
    /// Downloaded sources that no roster referenced.
    pub unpaired_downloads: Vec<String>,
}

impl BatchReport {
    pub fn successful(&self) -> impl Iterator<Item = &CourseOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    /// Unmatched rows of every successful course, in outcome order.
    pub fn all_unmatched(&self) -> impl Iterator<Item = &ReconciledRow> {
        self.successful().flat_map(|o| o.unmatched.iter())
    }

    /// Every admitted row of every successful course, in outcome order.
    pub fn all_rows(&self) -> impl Iterator<Item = &ReconciledRow> {
        self.successful().flat_map(|o| o.rows().iter())
    }
}

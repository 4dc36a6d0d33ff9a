use std::collections::{BTreeSet, HashMap, HashSet};

use crate::config::ReconConfig;
use crate::course::reconcile_rows;
use crate::error::CourseError;
use crate::header::read_roster_table;
use crate::model::{BatchMeta, BatchReport, BatchSummary, CourseOutcome, ReconciledRow};
use crate::source::GridSource;
use crate::table::Table;

/// Reconcile every roster against the downloaded table of the same course.
///
/// Produces exactly one outcome per roster, in roster order. Course failures
/// never abort the batch.
pub fn run<R: GridSource, D: GridSource>(rosters: &[R], downloaded: &[D], config: &ReconConfig) -> BatchReport {
    // Later uploads with the same course name replace earlier ones.
    let by_course: HashMap<String, &D> = downloaded.iter().map(|d| (d.course_name(), d)).collect();

    let mut tally = SummaryTally::default();
    let mut outcomes = Vec::with_capacity(rosters.len());
    let mut referenced: HashSet<String> = HashSet::new();

    for roster in rosters {
        let course = roster.course_name();
        let outcome = match by_course.get(&course) {
            Some(source) => {
                referenced.insert(course.clone());
                tally.total_courses += 1;
                log::info!("{course}: reconciling {} against {}", roster.name(), source.name());
                match reconcile_course(&course, roster, *source, config) {
                    Ok(rows) => CourseOutcome::success(&course, rows),
                    Err(e) => CourseOutcome::error(&course, e.to_string()),
                }
            }
            None => CourseOutcome::error(&course, CourseError::NoMatchingFile.to_string()),
        };

        if outcome.is_success() {
            log::info!("{course}: {}", outcome.message);
        } else {
            log::warn!("{course}: {}", outcome.message);
        }
        tally.record(&outcome);
        outcomes.push(outcome);
    }

    let unpaired_downloads: Vec<String> = downloaded
        .iter()
        .filter(|d| !referenced.contains(&d.course_name()))
        .map(|d| d.name().to_string())
        .collect();
    for name in &unpaired_downloads {
        log::warn!("{name}: no roster with a matching course name");
    }

    BatchReport {
        meta: BatchMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        summary: tally.finish(),
        outcomes,
        unpaired_downloads,
    }
}

/// Read both sources of one paired course and reconcile them.
/// Read failures surface as `ProcessingFailure`.
pub fn reconcile_course<R: GridSource + ?Sized, D: GridSource + ?Sized>(
    course: &str,
    roster: &R,
    downloaded: &D,
    config: &ReconConfig,
) -> Result<Vec<ReconciledRow>, CourseError> {
    let roster_grid = roster.read_grid().map_err(CourseError::ProcessingFailure)?;
    let roster_table = read_roster_table(roster_grid, &config.header, roster.name())?;

    let downloaded_grid = downloaded.read_grid().map_err(CourseError::ProcessingFailure)?;
    let downloaded_table = Table::from_grid(downloaded_grid, 0);

    reconcile_rows(course, &roster_table, &downloaded_table, config)
}

/// Running statistics. Tallies from independent course subsets combine with
/// [`SummaryTally::merge`].
#[derive(Debug, Clone, Default)]
pub struct SummaryTally {
    pub total_courses: usize,
    pub courses_with_mismatches: usize,
    pub total_mismatches: usize,
    pub total_students: usize,
    pub withdrawn_students: usize,
    pub failed_courses: usize,
    pub student_ids: BTreeSet<String>,
}

impl SummaryTally {
    /// Fold one outcome in. Error outcomes only count as failures;
    /// `total_courses` is tracked by the caller at pairing time.
    pub fn record(&mut self, outcome: &CourseOutcome) {
        if !outcome.is_success() {
            self.failed_courses += 1;
            return;
        }
        let rows = outcome.rows();
        self.total_students += rows.len();
        self.student_ids.extend(rows.iter().map(|r| r.student_id.clone()));
        self.withdrawn_students += outcome.withdrawn_ids.len();
        if !outcome.unmatched.is_empty() {
            self.courses_with_mismatches += 1;
            self.total_mismatches += outcome.unmatched.len();
        }
    }

    pub fn merge(mut self, other: SummaryTally) -> SummaryTally {
        self.total_courses += other.total_courses;
        self.courses_with_mismatches += other.courses_with_mismatches;
        self.total_mismatches += other.total_mismatches;
        self.total_students += other.total_students;
        self.withdrawn_students += other.withdrawn_students;
        self.failed_courses += other.failed_courses;
        self.student_ids.extend(other.student_ids);
        self
    }

    pub fn finish(self) -> BatchSummary {
        BatchSummary {
            total_courses: self.total_courses,
            courses_with_mismatches: self.courses_with_mismatches,
            total_mismatches: self.total_mismatches,
            total_students: self.total_students,
            unique_students: self.student_ids.len(),
            withdrawn_students: self.withdrawn_students,
            failed_courses: self.failed_courses,
        }
    }
}

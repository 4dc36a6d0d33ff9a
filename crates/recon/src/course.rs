use std::collections::BTreeMap;

use crate::config::{GradeRules, ReconConfig};
use crate::error::{CourseError, MissingColumn};
use crate::model::{CourseOutcome, DownloadedRow, JoinOrigin, ReconciledRow, RosterRow};
use crate::normalize::{admits_identifier, clean_grade, normalize_grade_token, normalize_identifier};
use crate::table::Table;

/// Reconcile one course: validate columns, outer-join on student id,
/// classify every admitted row. Never fails; column problems become an
/// error outcome.
pub fn reconcile(
    course: &str,
    roster: &Table,
    downloaded: &Table,
    config: &ReconConfig,
) -> CourseOutcome {
    match reconcile_rows(course, roster, downloaded, config) {
        Ok(rows) => CourseOutcome::success(course, rows),
        Err(e) => CourseOutcome::error(course, e.to_string()),
    }
}

/// Same as [`reconcile`] but surfaces the column error instead of folding
/// it into an outcome.
pub fn reconcile_rows(
    course: &str,
    roster: &Table,
    downloaded: &Table,
    config: &ReconConfig,
) -> Result<Vec<ReconciledRow>, CourseError> {
    let roster_rows = extract_roster_rows(roster, config)?;
    let downloaded_rows = extract_downloaded_rows(downloaded, config)?;

    let rows = outer_join(&roster_rows, &downloaded_rows)
        .into_iter()
        .filter_map(|joined| classify(course, joined, &config.grades))
        .collect();
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Column extraction
// ---------------------------------------------------------------------------

/// Pull (id, grade) out of a roster table. The identifier column is the first
/// accepted label present.
pub fn extract_roster_rows(table: &Table, config: &ReconConfig) -> Result<Vec<RosterRow>, CourseError> {
    let id_idx = config
        .roster
        .id_columns
        .iter()
        .find_map(|label| table.column(label))
        .ok_or(CourseError::MissingColumn(MissingColumn::RosterId))?;
    let grade_idx = table.column(&config.roster.grade_column).ok_or_else(|| {
        CourseError::MissingColumn(MissingColumn::RosterGrade(config.roster.grade_column.clone()))
    })?;

    Ok((0..table.row_count())
        .map(|r| RosterRow {
            student_id: normalize_identifier(table.cell(r, id_idx)),
            letter_grade: clean_grade(table.cell(r, grade_idx)),
        })
        .collect())
}

/// Pull (id, approved grade, withdrawn flag) out of a downloaded table.
/// A missing withdrawn column reads as empty flags.
pub fn extract_downloaded_rows(
    table: &Table,
    config: &ReconConfig,
) -> Result<Vec<DownloadedRow>, CourseError> {
    let cols = &config.downloaded;
    let (id_idx, grade_idx) = match (table.column(&cols.id_column), table.column(&cols.grade_column)) {
        (Some(i), Some(g)) => (i, g),
        _ => return Err(CourseError::MissingColumn(MissingColumn::Downloaded)),
    };
    let withdrawn_idx = table.column(&cols.withdrawn_column);

    Ok((0..table.row_count())
        .map(|r| DownloadedRow {
            student_id: normalize_identifier(table.cell(r, id_idx)),
            approved_grade: clean_grade(table.cell(r, grade_idx)),
            withdrawn_flag: withdrawn_idx
                .map(|w| clean_grade(table.cell(r, w)))
                .unwrap_or_default(),
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Join
// ---------------------------------------------------------------------------

/// One output row of the outer join. At least one side is present.
#[derive(Debug, Clone, Copy)]
pub struct JoinedRow<'a> {
    pub roster: Option<&'a RosterRow>,
    pub downloaded: Option<&'a DownloadedRow>,
}

impl JoinedRow<'_> {
    pub fn origin(&self) -> JoinOrigin {
        match (self.roster, self.downloaded) {
            (Some(_), Some(_)) => JoinOrigin::Both,
            (Some(_), None) => JoinOrigin::RosterOnly,
            _ => JoinOrigin::DownloadedOnly,
        }
    }

    /// Roster-side identifier wins; downloaded side fills in.
    pub fn resolved_id(&self) -> &str {
        self.roster
            .map(|r| r.student_id.as_str())
            .or_else(|| self.downloaded.map(|d| d.student_id.as_str()))
            .unwrap_or("")
    }
}

/// Full outer join keyed on the normalized identifier. Output is ordered by
/// key; a key repeated on both sides yields every roster x downloaded pairing.
pub fn outer_join<'a>(roster: &'a [RosterRow], downloaded: &'a [DownloadedRow]) -> Vec<JoinedRow<'a>> {
    let mut groups: BTreeMap<&str, (Vec<&RosterRow>, Vec<&DownloadedRow>)> = BTreeMap::new();
    for r in roster {
        groups.entry(r.student_id.as_str()).or_default().0.push(r);
    }
    for d in downloaded {
        groups.entry(d.student_id.as_str()).or_default().1.push(d);
    }

    let mut joined = Vec::new();
    for (_, (left, right)) in groups {
        match (left.is_empty(), right.is_empty()) {
            (false, false) => {
                for r in &left {
                    for d in &right {
                        joined.push(JoinedRow { roster: Some(*r), downloaded: Some(*d) });
                    }
                }
            }
            (false, true) => {
                joined.extend(left.iter().map(|r| JoinedRow { roster: Some(*r), downloaded: None }))
            }
            (true, false) => {
                joined.extend(right.iter().map(|d| JoinedRow { roster: None, downloaded: Some(*d) }))
            }
            (true, true) => {}
        }
    }
    joined
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Withdrawn when the approved grade is the withdrawal grade or the
/// withdrawn flag is set. Independent of mismatch.
pub fn is_withdrawn(downloaded: Option<&DownloadedRow>, rules: &GradeRules) -> bool {
    downloaded.is_some_and(|d| {
        d.approved_grade == rules.withdrawn_grade || d.withdrawn_flag == rules.withdrawn_flag
    })
}

/// Grade dispute between the two sides of a `both` row. An absence must
/// resolve to the failing grade; anything else compares after normalization.
pub fn is_mismatch(roster_grade: &str, downloaded_grade: &str, rules: &GradeRules) -> bool {
    let r = normalize_grade_token(roster_grade);
    let d = normalize_grade_token(downloaded_grade);
    if r == "ABSENT" {
        d != rules.absent_resolves_to
    } else {
        r != d
    }
}

/// Build the output row, or `None` when the resolved identifier fails the
/// admission filter.
fn classify(course: &str, joined: JoinedRow<'_>, rules: &GradeRules) -> Option<ReconciledRow> {
    let student_id = joined.resolved_id();
    if !admits_identifier(student_id) {
        return None;
    }

    let roster_grade = joined.roster.map(|r| r.letter_grade.clone()).unwrap_or_default();
    let downloaded_grade = joined
        .downloaded
        .map(|d| d.approved_grade.clone())
        .unwrap_or_default();
    let origin = joined.origin();
    let mismatch = origin == JoinOrigin::Both && is_mismatch(&roster_grade, &downloaded_grade, rules);

    Some(ReconciledRow {
        course: course.to_string(),
        student_id: student_id.to_string(),
        is_withdrawn: is_withdrawn(joined.downloaded, rules),
        roster_grade,
        downloaded_grade,
        matched: !mismatch,
        join_origin: origin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CourseStatus;
    use crate::table::RawGrid;

    fn table(rows: Vec<Vec<&str>>) -> Table {
        Table::from_grid(RawGrid::from(rows), 0)
    }

    fn config() -> ReconConfig {
        ReconConfig::default()
    }

    fn rules() -> GradeRules {
        GradeRules::default()
    }

    #[test]
    fn absent_resolved_to_f_is_matched() {
        assert!(!is_mismatch("ABSENT", "F", &rules()));
        assert!(!is_mismatch("abs", "f", &rules()));
        assert!(is_mismatch("ABSENT", "D", &rules()));
        assert!(is_mismatch("ABSENT", "", &rules()));
    }

    #[test]
    fn pass_spellings_match() {
        assert!(!is_mismatch("P", "PASS", &rules()));
        assert!(!is_mismatch("pass", "p", &rules()));
        assert!(is_mismatch("A", "A-", &rules()));
    }

    #[test]
    fn withdrawal_by_grade_or_flag() {
        let row = |grade: &str, flag: &str| DownloadedRow {
            student_id: "1".into(),
            approved_grade: grade.into(),
            withdrawn_flag: flag.into(),
        };
        assert!(is_withdrawn(Some(&row("W", "")), &rules()));
        assert!(is_withdrawn(Some(&row("F", "WITHDRAWN")), &rules()));
        assert!(!is_withdrawn(Some(&row("F", "NO")), &rules()));
        assert!(!is_withdrawn(None, &rules()));
    }

    #[test]
    fn outer_join_origins_sorted_by_key() {
        let roster = vec![
            RosterRow { student_id: "300".into(), letter_grade: "A".into() },
            RosterRow { student_id: "100".into(), letter_grade: "B".into() },
        ];
        let downloaded = vec![
            DownloadedRow { student_id: "200".into(), approved_grade: "C".into(), withdrawn_flag: String::new() },
            DownloadedRow { student_id: "100".into(), approved_grade: "B".into(), withdrawn_flag: String::new() },
        ];
        let joined = outer_join(&roster, &downloaded);
        let summary: Vec<(&str, JoinOrigin)> = joined.iter().map(|j| (j.resolved_id(), j.origin())).collect();
        assert_eq!(
            summary,
            vec![
                ("100", JoinOrigin::Both),
                ("200", JoinOrigin::DownloadedOnly),
                ("300", JoinOrigin::RosterOnly),
            ]
        );
    }

    #[test]
    fn duplicate_keys_cross_product() {
        let roster = vec![
            RosterRow { student_id: "1".into(), letter_grade: "A".into() },
            RosterRow { student_id: "1".into(), letter_grade: "B".into() },
        ];
        let downloaded = vec![
            DownloadedRow { student_id: "1".into(), approved_grade: "A".into(), withdrawn_flag: String::new() },
            DownloadedRow { student_id: "1".into(), approved_grade: "C".into(), withdrawn_flag: String::new() },
        ];
        assert_eq!(outer_join(&roster, &downloaded).len(), 4);
    }

    #[test]
    fn reconcile_classifies_and_filters() {
        let roster = table(vec![
            vec!["SID", "Name", "Letter Grade"],
            vec![" 100 ", "Ann", "absent"],
            vec!["101", "Bob", "b"],
            vec!["", "", ""],
            vec!["Total", "", ""],
        ]);
        let downloaded = table(vec![
            vec!["ID", "Approved final grade", "Withdrawn"],
            vec!["100", "F", ""],
            vec!["101", "C", ""],
            vec!["103", "w", ""],
        ]);
        let outcome = reconcile("CHEM110", &roster, &downloaded, &config());
        assert_eq!(outcome.status, CourseStatus::Success);
        let rows = outcome.rows();
        let ids: Vec<&str> = rows.iter().map(|r| r.student_id.as_str()).collect();
        assert_eq!(ids, vec!["100", "101", "103"]);

        assert!(rows[0].matched);
        assert_eq!(rows[0].roster_grade, "ABSENT");
        assert!(!rows[1].matched);
        assert_eq!(rows[1].roster_grade, "B");
        assert_eq!(rows[2].join_origin, JoinOrigin::DownloadedOnly);
        assert!(rows[2].matched);
        assert!(rows[2].is_withdrawn);
        assert_eq!(rows[2].roster_grade, "");

        assert_eq!(outcome.unmatched.len(), 1);
        assert_eq!(outcome.withdrawn_ids, vec!["103"]);
        assert_eq!(outcome.message, "Processed 3 students, found 1 mismatches, 1 withdrawn");
    }

    #[test]
    fn student_id_label_is_second_choice() {
        let roster = table(vec![vec!["Student ID", "Letter Grade"], vec!["5", "A"]]);
        let downloaded = table(vec![vec!["ID", "Approved final grade"], vec!["5", "A"]]);
        let outcome = reconcile("X", &roster, &downloaded, &config());
        assert!(outcome.is_success());
        assert_eq!(outcome.rows()[0].join_origin, JoinOrigin::Both);
        // no withdrawn column: synthesized empty
        assert!(!outcome.rows()[0].is_withdrawn);
    }

    #[test]
    fn missing_columns_are_distinct_errors() {
        let good_downloaded = table(vec![vec!["ID", "Approved final grade"]]);

        let no_id = table(vec![vec!["Name", "Letter Grade"]]);
        let outcome = reconcile("X", &no_id, &good_downloaded, &config());
        assert_eq!(outcome.status, CourseStatus::Error);
        assert_eq!(outcome.message, "Required student id column is missing.");

        let no_grade = table(vec![vec!["SID", "Grade"]]);
        let outcome = reconcile("X", &no_grade, &good_downloaded, &config());
        assert_eq!(outcome.message, "'Letter Grade' column is missing.");

        let roster = table(vec![vec!["SID", "Letter Grade"]]);
        let bad_downloaded = table(vec![vec!["ID", "Final grade"]]);
        let outcome = reconcile("X", &roster, &bad_downloaded, &config());
        assert_eq!(outcome.message, "Required columns are missing in downloaded file.");
        assert!(outcome.rows.is_none());
    }

    #[test]
    fn withdrawn_flag_case_insensitive() {
        let roster = table(vec![vec!["SID", "Letter Grade"], vec!["7", "F"]]);
        let downloaded = table(vec![
            vec!["ID", "Approved final grade", "Withdrawn"],
            vec!["7", "F", " withdrawn "],
        ]);
        let outcome = reconcile("X", &roster, &downloaded, &config());
        assert!(outcome.rows()[0].is_withdrawn);
        assert!(outcome.rows()[0].matched);
    }
}

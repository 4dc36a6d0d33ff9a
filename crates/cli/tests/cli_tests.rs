// End-to-end tests for the `gradecheck` binary.
// Run with: cargo test -p gradecheck-cli --test cli_tests -- --nocapture

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::{tempdir, TempDir};

fn gradecheck(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_gradecheck"));
    // Keep any real per-user config out of the run
    cmd.env("XDG_CONFIG_HOME", home);
    cmd.env("HOME", home);
    cmd.env_remove("GRADECHECK_CONFIG");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn run(home: &Path, args: &[&str]) -> Output {
    gradecheck(home).args(args).output().expect("spawn gradecheck")
}

fn code(output: &Output) -> i32 {
    output.status.code().expect("exit code")
}

/// Workspace with `rosters/` and `downloads/` directories.
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("rosters")).unwrap();
        fs::create_dir(dir.path().join("downloads")).unwrap();
        Self { dir }
    }

    fn path(&self, rel: &str) -> String {
        self.dir.path().join(rel).to_string_lossy().into_owned()
    }

    fn roster(&self, course: &str, rows: &[(&str, &str)]) {
        let mut text = String::from("Final grade roster,,\n,,\nSID,Name,Letter Grade\n");
        for (id, grade) in rows {
            text.push_str(&format!("{id},Student,{grade}\n"));
        }
        fs::write(self.dir.path().join("rosters").join(format!("{course}.csv")), text).unwrap();
    }

    fn download(&self, course: &str, rows: &[(&str, &str, &str)]) {
        let mut text = String::from("ID,Approved final grade,Withdrawn\n");
        for (id, grade, flag) in rows {
            text.push_str(&format!("{id},{grade},{flag}\n"));
        }
        fs::write(self.dir.path().join("downloads").join(format!("{course}.csv")), text).unwrap();
    }

    fn compare(&self, extra: &[&str]) -> Output {
        let rosters = self.path("rosters");
        let downloads = self.path("downloads");
        let mut args = vec!["compare", "--roster", &rosters, "--downloaded", &downloads];
        args.extend_from_slice(extra);
        run(self.dir.path(), &args)
    }
}

// ---------------------------------------------------------------------------
// compare
// ---------------------------------------------------------------------------

#[test]
fn compare_json_report() {
    let fx = Fixture::new();
    fx.roster("MATH101", &[("100", "A"), ("101", "ABSENT"), ("102", "P")]);
    fx.download("MATH101", &[("100", "A", ""), ("101", "F", ""), ("102", "PASS", "")]);

    let output = fx.compare(&["--json"]);
    assert_eq!(code(&output), 0, "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(report["summary"]["total_courses"], 1);
    assert_eq!(report["summary"]["total_students"], 3);
    assert_eq!(report["summary"]["total_mismatches"], 0);
    assert_eq!(report["outcomes"][0]["course"], "MATH101");
    assert_eq!(report["outcomes"][0]["status"], "success");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("MATH101: Processed 3 students, found 0 mismatches, 0 withdrawn"));
}

#[test]
fn compare_mismatch_exit_only_with_strict() {
    let fx = Fixture::new();
    fx.roster("PHYS110", &[("200", "ABSENT")]);
    fx.download("PHYS110", &[("200", "D", "")]);

    assert_eq!(code(&fx.compare(&[])), 0);

    let strict = fx.compare(&["--strict"]);
    assert_eq!(code(&strict), 1);
    assert!(String::from_utf8_lossy(&strict.stderr).contains("1 mismatches found"));
}

#[test]
fn compare_writes_results_and_zip() {
    let fx = Fixture::new();
    fx.roster("MATH101", &[("1", "A"), ("2", "B")]);
    fx.download("MATH101", &[("1", "A", ""), ("2", "C", ""), ("3", "W", "")]);
    let out = fx.path("results");

    let output = fx.compare(&["--out", &out, "--zip"]);
    assert_eq!(code(&output), 0, "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let out = Path::new(&out);
    for name in [
        "all_results.csv",
        "all_mismatches.csv",
        "MATH101_comparison.csv",
        "summary.json",
        "comparison_results.zip",
    ] {
        assert!(out.join(name).exists(), "missing {name}");
    }
    let mismatches = fs::read_to_string(out.join("all_mismatches.csv")).unwrap();
    assert_eq!(mismatches.lines().count(), 2);
    assert!(mismatches.contains("MATH101,2,B,C,false,false,both"));
}

#[test]
fn compare_zip_holds_only_this_run() {
    let fx = Fixture::new();
    fx.roster("MATH101", &[("1", "A")]);
    fx.download("MATH101", &[("1", "A", "")]);
    let out = fx.dir.path().join("results");
    fs::create_dir(&out).unwrap();
    fs::write(out.join("CHEM150_comparison.csv"), "course\nCHEM150\n").unwrap();
    fs::write(out.join("notes.txt"), "keep me out").unwrap();

    let output = fx.compare(&["--out", out.to_str().unwrap(), "--zip"]);
    assert_eq!(code(&output), 0, "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let file = fs::File::open(out.join("comparison_results.zip")).unwrap();
    let archive = zip::ZipArchive::new(file).unwrap();
    let mut names: Vec<&str> = archive.file_names().collect();
    names.sort();
    assert_eq!(names, vec!["MATH101_comparison.csv", "all_results.csv", "summary.json"]);
}

#[test]
fn compare_zip_requires_out() {
    let fx = Fixture::new();
    fx.roster("MATH101", &[("1", "A")]);
    fx.download("MATH101", &[("1", "A", "")]);
    assert_eq!(code(&fx.compare(&["--zip"])), 2);
}

#[test]
fn compare_all_courses_failed() {
    let fx = Fixture::new();
    fx.roster("MATH101", &[("1", "A")]);
    fx.download("BIO200", &[("1", "A", "")]);

    let output = fx.compare(&[]);
    assert_eq!(code(&output), 7);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("MATH101: error: No matching downloaded file found"));
    assert!(stderr.contains("BIO200.csv: no roster with this name"));
}

#[test]
fn compare_one_failure_does_not_fail_batch() {
    let fx = Fixture::new();
    fx.roster("MATH101", &[("1", "A")]);
    fx.roster("CHEM100", &[("5", "B")]);
    fx.download("MATH101", &[("1", "A", "")]);

    let output = fx.compare(&["--json"]);
    assert_eq!(code(&output), 0);
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    // directory entries are read in name order
    assert_eq!(report["outcomes"][0]["course"], "CHEM100");
    assert_eq!(report["outcomes"][0]["status"], "error");
    assert_eq!(report["outcomes"][1]["status"], "success");
    assert_eq!(report["summary"]["failed_courses"], 1);
}

#[test]
fn compare_invalid_config() {
    let fx = Fixture::new();
    fx.roster("MATH101", &[("1", "A")]);
    fx.download("MATH101", &[("1", "A", "")]);
    let config = fx.path("bad.toml");
    fs::write(&config, "[grades]\nwithdrawn_grade = \"\"\n").unwrap();

    let output = fx.compare(&["--config", &config]);
    assert_eq!(code(&output), 6);
    assert!(String::from_utf8_lossy(&output.stderr).contains("grades.withdrawn_grade"));
}

#[test]
fn compare_custom_config_labels() {
    let fx = Fixture::new();
    fs::write(
        fx.dir.path().join("rosters/ENG105.csv"),
        "Matric No,Final\n300,B\n",
    )
    .unwrap();
    fx.download("ENG105", &[("300", "B", "")]);
    let config = fx.path("recon.toml");
    fs::write(
        &config,
        "[header]\ngrade_marker = \"final\"\nid_markers = [\"Matric No\"]\n\n\
         [roster]\nid_columns = [\"Matric No\"]\ngrade_column = \"Final\"\n",
    )
    .unwrap();

    let output = fx.compare(&["--config", &config, "--json", "--strict"]);
    assert_eq!(code(&output), 0, "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["outcomes"][0]["rows"][0]["student_id"], "300");
}

#[test]
fn compare_missing_input_is_io_error() {
    let fx = Fixture::new();
    let missing = fx.path("nope");
    let downloads = fx.path("downloads");
    let output = run(
        fx.dir.path(),
        &["compare", "--roster", &missing, "--downloaded", &downloads],
    );
    assert_eq!(code(&output), 3);
}

#[test]
fn compare_empty_directory_is_usage_error() {
    let fx = Fixture::new();
    fx.download("MATH101", &[("1", "A", "")]);
    assert_eq!(code(&fx.compare(&[])), 2);
}

#[test]
fn compare_xlsx_roster() {
    let fx = Fixture::new();
    let path = fx.dir.path().join("rosters/STAT201.xlsx");
    let mut wb = rust_xlsxwriter::Workbook::new();
    let ws = wb.add_worksheet();
    ws.write_string(0, 0, "STAT201 grades").unwrap();
    ws.write_string(2, 0, "Student ID").unwrap();
    ws.write_string(2, 1, "Letter Grade").unwrap();
    ws.write_number(3, 0, 202012345.0).unwrap();
    ws.write_string(3, 1, "B").unwrap();
    wb.save(&path).unwrap();
    fx.download("STAT201", &[("202012345", "A", "")]);

    let output = fx.compare(&["--json"]);
    assert_eq!(code(&output), 0, "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["summary"]["total_mismatches"], 1);
    assert_eq!(report["outcomes"][0]["unmatched"][0]["student_id"], "202012345");
}

#[test]
fn missing_subcommand_args_is_usage_error() {
    let home = tempdir().unwrap();
    assert_eq!(code(&run(home.path(), &["compare"])), 2);
}

// ---------------------------------------------------------------------------
// merge
// ---------------------------------------------------------------------------

fn write_archive(path: &Path, files: &[(&str, &str)]) {
    let file = fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    for (name, content) in files {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

#[test]
fn merge_then_compare() {
    let fx = Fixture::new();
    let archive = fx.dir.path().join("exports.zip");
    write_archive(
        &archive,
        &[
            ("MATH101_1.csv", "ID,Approved final grade,Withdrawn\n1,A,\n"),
            ("MATH101_2.csv", "ID,Approved final grade\n2,B\n"),
        ],
    );
    let merged = fx.path("merged");

    let output = run(
        fx.dir.path(),
        &["merge", archive.to_str().unwrap(), "--out", &merged, "--zip", "--json"],
    );
    assert_eq!(code(&output), 0, "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["merged"][0]["course"], "MATH101");
    assert_eq!(report["merged"][0]["files"], 2);
    assert!(Path::new(&merged).join("merged_files.zip").exists());

    fx.roster("MATH101", &[("1", "A"), ("2", "B")]);
    let rosters = fx.path("rosters");
    let output = run(
        fx.dir.path(),
        &["compare", "--roster", &rosters, "--downloaded", &merged, "--strict"],
    );
    assert_eq!(code(&output), 0, "stderr: {}", String::from_utf8_lossy(&output.stderr));
}

#[test]
fn merge_rejects_non_zip() {
    let fx = Fixture::new();
    let bogus = fx.dir.path().join("exports.zip");
    fs::write(&bogus, "not a zip").unwrap();
    let out = fx.path("merged");
    let output = run(fx.dir.path(), &["merge", bogus.to_str().unwrap(), "--out", &out]);
    assert_eq!(code(&output), 3);
}

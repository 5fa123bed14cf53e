// Integration tests for the `mwork` binary: exit codes and the --json stdout contract.
// Run with: cargo test -p meterworks-cli --test cli_tests -- --nocapture

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn mwork() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_mwork"));
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../recon/tests/fixtures")
        .join(name)
}

fn run(args: &[&str]) -> Output {
    mwork().args(args).output().expect("run mwork")
}

fn water() -> String {
    fixture("water.toml").to_string_lossy().into_owned()
}

/// Assert stdout is a single, parseable JSON value with no extra lines.
fn assert_single_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "exit code: {:?}\nstderr: {}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let trimmed = stdout.trim();
    assert!(!trimmed.is_empty(), "stdout should not be empty");
    serde_json::from_str(trimmed)
        .unwrap_or_else(|e| panic!("stdout must be valid JSON.\nParse error: {e}\nstdout:\n{trimmed}"))
}

// ===========================================================================
// mwork validate
// ===========================================================================

#[test]
fn validate_fixture() {
    let output = run(&["validate", &water()]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("valid: water dataset 'Water distribution' with 10 meter(s)"), "{stderr}");
    assert!(stderr.contains("3 periods (2025-01..2025-03)"), "{stderr}");
}

#[test]
fn validate_dangling_parent_is_structural() {
    let dangling = fixture("dangling.toml");
    let output = run(&["validate", dangling.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(11));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("error: structural data error:"), "{stderr}");
    assert!(stderr.contains("hint:"));
}

#[test]
fn validate_missing_file_is_io_error() {
    let output = run(&["validate", "does-not-exist.toml"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn validate_bad_toml_is_invalid_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "name = \"x\"\n[[meters]]\nid = \"L1\"\nlevel = \"reservoir\"\n").unwrap();
    let output = run(&["validate", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(10));
}

#[test]
fn validate_short_csv_row_is_invalid_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tiny.toml");
    std::fs::write(
        &path,
        "name = \"Tiny\"\nreadings_file = \"r.csv\"\n\n[[meters]]\nid = \"L1\"\nlevel = \"main\"\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("r.csv"), "meter_id,period,value\nL1,2025-04\n").unwrap();

    let output = run(&["validate", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(10));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("readings:"), "{stderr}");
}

// ===========================================================================
// mwork metrics / series / children
// ===========================================================================

#[test]
fn metrics_zone_json() {
    let output = run(&["metrics", &water(), "--zone", "Z3", "--period", "2025-01", "--json"]);
    let val = assert_single_json(&output);
    assert_eq!(val["scope"], "zones Z3");
    assert_eq!(val["period"], "2025-01");
    assert_eq!(val["supply"], 300.0);
    assert_eq!(val["consumption"], 180.0);
    assert_eq!(val["loss_percentage"], 40.0);
}

#[test]
fn metrics_main_supply_human() {
    let output = run(&["metrics", &water(), "--main", "--period", "2025-01"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("scope:        main supply"), "{stdout}");
    assert!(stdout.contains("supply:       1,000.00 m3"), "{stdout}");
    assert!(stdout.contains("loss:         60.00 m3 (6.0%)"), "{stdout}");
}

#[test]
fn metrics_bad_period_is_usage_error() {
    let output = run(&["metrics", &water(), "--period", "2025-13"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn series_json_has_every_period() {
    let output = run(&["series", &water(), "--zone", "Z5", "--json"]);
    let val = assert_single_json(&output);
    let periods = val["periods"].as_array().unwrap();
    assert_eq!(periods.len(), 3);
    assert_eq!(periods[1]["period"], "2025-02");
    assert_eq!(periods[1]["loss"], -12.0);
    assert_eq!(periods[1]["loss_percentage"], 0.0);
}

#[test]
fn children_of_main_json() {
    let output = run(&["children", &water(), "L1", "--period", "2025-01", "--json"]);
    let val = assert_single_json(&output);
    let ids: Vec<&str> = val["children"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["Z3", "DC-HOTEL", "Z5", "Z8"]);
    assert_eq!(val["children"][1]["level"], "direct_connection");
}

#[test]
fn children_of_unknown_meter() {
    let output = run(&["children", &water(), "NOPE"]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown meter 'NOPE'"));
}

// ===========================================================================
// mwork report
// ===========================================================================

#[test]
fn report_json_and_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("report.json");
    let output = run(&[
        "report",
        &water(),
        "--period",
        "2025-01",
        "--json",
        "--output",
        out.to_str().unwrap(),
    ]);
    let val = assert_single_json(&output);
    assert_eq!(val["meta"]["dataset"], "Water distribution");
    assert_eq!(val["system"]["total"]["loss"], 180.0);
    assert_eq!(val["zones"][0]["zone"], "Z3");
    assert_eq!(val["zones"][0]["band"], "critical");

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written["summary"], val["summary"]);
}

#[test]
fn report_strict_fails_on_critical_zone() {
    let output = run(&["report", &water(), "--period", "2025-01", "--strict"]);
    assert_eq!(output.status.code(), Some(12));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("critical loss in zone(s): Z3"), "{stderr}");

    let lenient = run(&["report", &water(), "--period", "2025-01"]);
    assert!(lenient.status.success());
    assert!(lenient.stdout.is_empty());
}

use assert_cmd::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;

const BAR_SERIES: &str = r#"{"type": "bar", "data": {"1": {"X": 10}, "9": {"X": 5}, "10": {"X": 20}}}"#;

fn write_series(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, body).expect("write series");
    path.to_string_lossy().into_owned()
}

fn cli() -> Command {
    Command::new(assert_cmd::cargo_bin!("wardchart-cli"))
}

#[test]
fn render_writes_svg_and_registers_the_chart() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let out_dir = tmp.path().join("charts");
    let series = write_series(tmp.path(), "wards.json", BAR_SERIES);

    let output = cli()
        .args(["render", "--no-raster", "--out-dir"])
        .arg(&out_dir)
        .args(["--title", "Households", &series])
        .output()
        .expect("run");
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let reference: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(reference["key"], "wards");
    assert_eq!(reference["file_path"], "wards_bar.svg");
    assert_eq!(reference["format"], "svg");
    assert!(out_dir.join("wards_bar.svg").exists());

    let registry = fs::read_to_string(out_dir.join("registry.json")).expect("registry");
    assert!(registry.contains("\"wards\""));

    let status = cli()
        .args(["status", "wards", "--out-dir"])
        .arg(&out_dir)
        .output()
        .expect("run");
    let status: serde_json::Value = serde_json::from_slice(&status.stdout).expect("json");
    assert_eq!(status["needs_generation"], false);
    assert_eq!(status["record"]["chart_type"], "bar");
}

#[test]
fn cleanup_drops_records_for_deleted_files() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let out_dir = tmp.path().join("charts");
    for name in ["a.json", "b.json"] {
        let series = write_series(tmp.path(), name, BAR_SERIES);
        cli()
            .args(["render", "--no-raster", "--out-dir"])
            .arg(&out_dir)
            .arg(&series)
            .assert()
            .success();
    }
    fs::remove_file(out_dir.join("a_bar.svg")).expect("remove");

    let output = cli()
        .args(["cleanup", "--out-dir"])
        .arg(&out_dir)
        .output()
        .expect("run");
    assert!(output.status.success());
    let cleanup: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(cleanup["removed"], 1);

    let output = cli()
        .args(["list", "--out-dir"])
        .arg(&out_dir)
        .output()
        .expect("run");
    let records: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(records.as_array().map(Vec::len), Some(1));
    assert_eq!(records[0]["key"], "b");
}

#[test]
fn svg_prints_to_stdout_without_a_cache() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let series = write_series(
        tmp.path(),
        "pie.json",
        r#"{"type": "pie", "data": {"A": 30, "B": 70}}"#,
    );
    let output = cli()
        .current_dir(tmp.path())
        .args(["svg", &series])
        .output()
        .expect("run");
    assert!(output.status.success());
    let svg = String::from_utf8(output.stdout).expect("utf8");
    assert!(svg.starts_with("<svg"));
    assert_eq!(svg.matches(r#"class="slice""#).count(), 2);
    assert!(!tmp.path().join("charts").exists());
}

#[test]
fn empty_series_exits_with_status_3() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let out_dir = tmp.path().join("charts");
    let series = write_series(tmp.path(), "zero.json", r#"{"type": "pie", "data": {"A": 0}}"#);
    cli()
        .args(["render", "--no-raster", "--out-dir"])
        .arg(&out_dir)
        .arg(&series)
        .assert()
        .code(3);
    assert!(!out_dir.join("registry.json").exists());
}

#[test]
fn malformed_series_fails() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let series = write_series(tmp.path(), "bad.json", r#"{"type": "pie", "data": {"A": -4}}"#);
    cli()
        .current_dir(tmp.path())
        .args(["svg", &series])
        .assert()
        .code(1);
}

#[test]
fn unknown_command_prints_usage() {
    cli().arg("explode").assert().code(2);
}

#[test]
fn verbose_logs_the_chosen_key_on_stderr() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let out_dir = tmp.path().join("charts");
    let series = write_series(tmp.path(), "wards.json", BAR_SERIES);

    let output = cli()
        .env_remove("RUST_LOG")
        .args(["render", "--verbose", "--no-raster", "--out-dir"])
        .arg(&out_dir)
        .arg(&series)
        .output()
        .expect("run");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("loaded config"), "{stderr}");
    assert!(stderr.contains("rendering chart"), "{stderr}");
    assert!(stderr.contains("wards"), "{stderr}");
}

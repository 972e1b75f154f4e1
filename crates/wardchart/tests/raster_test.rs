#![cfg(unix)]

use std::fs;
use std::time::{Duration, Instant};
use wardchart::raster::{CommandRasterizer, RasterError, RasterRequest, Rasterizer};

fn request(dir: &std::path::Path) -> RasterRequest {
    let input = dir.join("chart.svg");
    fs::write(&input, "<svg xmlns=\"http://www.w3.org/2000/svg\"/>").unwrap();
    RasterRequest {
        input,
        output: dir.join("chart.png"),
        dpi: 150,
    }
}

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn missing_tool_is_reported_not_raised() {
    let dir = tempfile::tempdir().unwrap();
    let r = CommandRasterizer::rsvg_convert(Duration::from_secs(5))
        .with_program("wardchart-no-such-rasterizer");
    let err = r.rasterize(&request(dir.path())).unwrap_err();
    assert!(matches!(err, RasterError::ToolNotFound { .. }));
}

#[test]
fn non_zero_exit_is_a_failure() {
    let dir = tempfile::tempdir().unwrap();
    let r = CommandRasterizer::new("false", Vec::new(), Duration::from_secs(5));
    let err = r.rasterize(&request(dir.path())).unwrap_err();
    assert!(matches!(err, RasterError::ExitStatus { .. }));
}

#[test]
fn hung_tool_is_killed_at_the_deadline() {
    let dir = tempfile::tempdir().unwrap();
    let r = CommandRasterizer::new("sleep", args(&["10"]), Duration::from_millis(200));
    let started = Instant::now();
    let err = r.rasterize(&request(dir.path())).unwrap_err();
    assert!(matches!(err, RasterError::Timeout { .. }));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn success_requires_a_non_empty_output() {
    let dir = tempfile::tempdir().unwrap();
    let req = request(dir.path());

    let copy = CommandRasterizer::new(
        "cp",
        args(&["{input}", "{output}"]),
        Duration::from_secs(5),
    );
    copy.rasterize(&req).unwrap();
    assert!(req.output.exists());

    let noop = CommandRasterizer::new("true", Vec::new(), Duration::from_secs(5));
    let empty = RasterRequest {
        output: dir.path().join("never.png"),
        ..req
    };
    assert!(matches!(
        noop.rasterize(&empty),
        Err(RasterError::EmptyOutput { .. })
    ));
}

#[test]
fn timeout_holds_when_the_tool_leaves_a_child_running() {
    let dir = tempfile::tempdir().unwrap();
    // The shell forks `sleep`, which keeps the stderr pipe open after the shell is killed.
    let r = CommandRasterizer::new(
        "sh",
        args(&["-c", "sleep 10; true"]),
        Duration::from_millis(300),
    );
    let started = Instant::now();
    let err = r.rasterize(&request(dir.path())).unwrap_err();
    assert!(matches!(err, RasterError::Timeout { .. }));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn failed_tool_leaves_no_output_behind() {
    let dir = tempfile::tempdir().unwrap();
    let req = request(dir.path());

    let failing = CommandRasterizer::new(
        "sh",
        args(&["-c", "printf partial > \"$1\"; echo broken >&2; exit 1", "sh", "{output}"]),
        Duration::from_secs(5),
    );
    match failing.rasterize(&req) {
        Err(RasterError::ExitStatus { stderr, .. }) => assert_eq!(stderr, "broken"),
        other => panic!("expected exit status failure, got {other:?}"),
    }
    assert!(!req.output.exists());

    let hung = CommandRasterizer::new(
        "sh",
        args(&["-c", "printf partial > \"$1\"; exec sleep 10", "sh", "{output}"]),
        Duration::from_millis(500),
    );
    let err = hung.rasterize(&req).unwrap_err();
    assert!(matches!(err, RasterError::Timeout { .. }));
    assert!(!req.output.exists());
}

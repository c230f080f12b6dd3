//! Integration tests for `modelcmp inspect`.
#![allow(clippy::expect_used)]

use std::path::PathBuf;
use std::process::{Command, Output};

/// Path to the compiled `modelcmp` binary.
fn modelcmp_bin() -> PathBuf {
    let mut path = std::env::current_exe().expect("current exe");
    path.pop();
    if path.ends_with("deps") {
        path.pop();
    }
    path.push("modelcmp");
    path
}

/// Path to a shared fixture file.
fn fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("../../tests/fixtures");
    path.push(name);
    path.to_str().expect("path").to_owned()
}

fn run(args: &[&str]) -> Output {
    Command::new(modelcmp_bin())
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("MODELCMP_MAX_FILE_SIZE")
        .output()
        .expect("run modelcmp inspect")
}

#[test]
fn inspect_prints_human_statistics() {
    let out = run(&["inspect", &fixture("library-base.json")]);
    assert_eq!(out.status.code(), Some(0));
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("root:           lib (Library)"), "{text}");
    assert!(text.contains("nodes:          5"), "{text}");
    assert!(text.contains("  Writer: 2"), "{text}");
    assert!(text.contains("containment:    4"), "{text}");
    assert!(text.contains("cross links:    3"), "{text}");
    assert!(text.contains("depth:          1"), "{text}");
}

#[test]
fn inspect_json_output() {
    let out = run(&["inspect", &fixture("library-modified.json"), "--format", "json"]);
    assert_eq!(out.status.code(), Some(0));
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).expect("valid JSON");
    assert_eq!(value["root"], "lib");
    assert_eq!(value["node_count"], 6);
    assert_eq!(value["node_counts"]["Writer"], 3);
    assert_eq!(value["feature_counts"]["authors"], 3);
}

#[test]
fn inspect_reports_malformed_containment() {
    let out = run(&["inspect", &fixture("cycle.json")]);
    assert_eq!(out.status.code(), Some(0));
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("structure:      containment cycle"), "{text}");
}

#[test]
fn inspect_malformed_file_exits_2() {
    let out = run(&["inspect", &fixture("malformed.json")]);
    assert_eq!(out.status.code(), Some(2));
    let err = String::from_utf8_lossy(&out.stderr);
    assert!(err.contains("invalid model"), "stderr: {err}");
}

#[test]
fn inspect_runs_with_no_color_set() {
    let out = Command::new(modelcmp_bin())
        .args(["inspect", &fixture("library-base.json")])
        .env("NO_COLOR", "1")
        .output()
        .expect("run modelcmp inspect");
    assert_eq!(out.status.code(), Some(0));
}

#[test]
fn inspect_missing_file_exits_2() {
    let out = run(&["inspect", "/nonexistent/model.json"]);
    assert_eq!(out.status.code(), Some(2));
}

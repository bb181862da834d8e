use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use std::io::Write;

fn write_dockerfile(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn prints_help() {
    let mut cmd = Command::cargo_bin("tally").unwrap();
    cmd.arg("--help").assert().success().stdout(contains("Usage"));
}

#[test]
fn lint_reports_violations_and_exits_nonzero_on_error() {
    let file = write_dockerfile("FROM ubuntu\nRUN sudo apt-get install curl\n");
    let mut cmd = Command::cargo_bin("tally").unwrap();
    cmd.args(["lint", file.path().to_str().unwrap(), "--no-async"])
        .assert()
        .failure()
        .stdout(contains("DL3006").or(contains("DL3004")));
}

#[test]
fn lint_clean_dockerfile_succeeds() {
    let file = write_dockerfile("FROM ubuntu:22.04\n");
    let mut cmd = Command::cargo_bin("tally").unwrap();
    cmd.args(["lint", file.path().to_str().unwrap(), "--no-async"]).assert().success();
}

#[test]
fn lint_json_format_emits_valid_json() {
    let file = write_dockerfile("FROM ubuntu\n");
    let mut cmd = Command::cargo_bin("tally").unwrap();
    let output = cmd
        .args(["lint", file.path().to_str().unwrap(), "--no-async", "--format", "json"])
        .assert()
        .failure()
        .get_output()
        .stdout
        .clone();
    let parsed: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert!(parsed["findings"].is_array());
}

#[test]
fn fix_rewrites_the_file_in_place() {
    let file = write_dockerfile("FROM ubuntu:22.04\nMAINTAINER me@example.com\n");
    let mut cmd = Command::cargo_bin("tally").unwrap();
    cmd.args(["fix", file.path().to_str().unwrap(), "--no-async"]).assert().success();

    let rewritten = std::fs::read_to_string(file.path()).unwrap();
    assert!(rewritten.to_ascii_uppercase().contains("LABEL"));
}

#[test]
fn lint_missing_file_fails() {
    let mut cmd = Command::cargo_bin("tally").unwrap();
    cmd.args(["lint", "/no/such/Dockerfile"]).assert().failure();
}

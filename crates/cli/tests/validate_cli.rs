//! Exercises the `lambda-validate` binary end to end (spec §6 CLI surface):
//! reads a data file and schema file from disk, checks stdout and exit code.

use std::io::Write;
use std::process::Command;

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_lambda-validate"))
}

fn write_tmp(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
    path
}

#[test]
fn passing_document_exits_zero_and_prints_pass_banner() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write_tmp(&dir, "point_schema.ls", "type Point = { x: int, y: int }");
    let data = write_tmp(&dir, "point.json", r#"{"x": 1, "y": 2}"#);

    let output = bin()
        .arg(&data)
        .arg("-f")
        .arg("json")
        .arg("-s")
        .arg(&schema)
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("✅ Validation PASSED"), "stdout was: {stdout}");
}

#[test]
fn missing_field_exits_nonzero_and_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let schema = write_tmp(&dir, "point_schema.ls", "type Point = { x: int, y: int }");
    let data = write_tmp(&dir, "point.json", r#"{"x": 1}"#);

    let output = bin()
        .arg(&data)
        .arg("-f")
        .arg("json")
        .arg("-s")
        .arg(&schema)
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("❌ Validation FAILED"), "stdout was: {stdout}");
    assert!(stdout.contains(".y"), "stdout was: {stdout}");
}

#[test]
fn unreadable_data_file_exits_with_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist.json");

    let output = bin().arg(&missing).output().unwrap();

    assert_eq!(output.status.code(), Some(2));
}

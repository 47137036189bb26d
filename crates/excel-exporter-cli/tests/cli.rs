use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use std::error::Error;
use tempfile::tempdir;

fn exporter_cmd() -> Command {
    let mut cmd = Command::cargo_bin("excel-exporter").expect("Failed to find excel-exporter binary");
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    exporter_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("Excel Exporter - Command Line Interface"))
        .stdout(contains("Usage: excel-exporter <input_file> <arguments>"))
        .stdout(contains("--outputDir; -od"))
        .stdout(contains("--saveType; -st"));
}

#[test]
fn test_version() {
    exporter_cmd()
        .arg("-v")
        .assert()
        .success()
        .stdout(contains(format!("Version {}", env!("CARGO_PKG_VERSION"))));
}

#[test]
fn test_no_arguments() {
    exporter_cmd()
        .assert()
        .failure()
        .stdout(contains("No valid arguments provided"));
}

#[test]
fn test_unknown_extension_is_rejected() {
    exporter_cmd()
        .arg("notes.txt")
        .assert()
        .failure()
        .stdout(contains("Invalid file type auto-detected from input file 'txt'"));
}

#[test]
fn test_missing_flag_value() {
    exporter_cmd()
        .args(["report.xlsm", "--outputDir"])
        .assert()
        .failure()
        .stdout(contains("Missing value after --outputDir or -od"));
}

#[test]
fn test_missing_input_file() -> Result<(), Box<dyn Error>> {
    let out = tempdir()?;
    let input = out.path().join("absent.xlsx");

    exporter_cmd()
        .arg(input.to_str().unwrap())
        .args(["-od", out.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("Input file not found"));

    // Nothing is created before the input is known to exist
    assert!(!out.path().join("absent_internals").exists());
    Ok(())
}

#[test]
fn test_missing_bridge_executable() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("book.xlsx");
    std::fs::write(&input, b"not really a workbook")?;

    exporter_cmd()
        .arg(input.to_str().unwrap())
        .env("EXCEL_EXPORTER_BRIDGE", dir.path().join("no-such-bridge.exe"))
        .assert()
        .failure()
        .stderr(contains("Failed to start the Excel bridge"))
        .stderr(contains("Bridge executable not found").and(contains("no-such-bridge.exe")));

    assert!(dir.path().join("book_internals/Sheets").is_dir());
    Ok(())
}

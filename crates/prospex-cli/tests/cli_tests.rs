//! End-to-end tests for the prospex binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn prospex() -> Command {
    Command::cargo_bin("prospex").unwrap()
}

#[test]
fn test_process_json_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("deal.txt");
    std::fs::write(
        &input,
        "PLAN OF DISTRIBUTION\nJoint Lead Managers: BNP Paribas, Deutsche Bank AG\nFINAL TERMS\nAggregate Nominal Amount: EUR 500,000,000\nIssue Date: 15 March 2024\n",
    )
    .unwrap();

    prospex()
        .arg("process")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"document_id\": \"deal\""))
        .stdout(predicate::str::contains("Deutsche Bank AG"))
        .stdout(predicate::str::contains("\"currency\": \"EUR\""));
}

#[test]
fn test_process_missing_input() {
    prospex()
        .arg("process")
        .arg("/nonexistent/file.txt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_process_csv_format() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("deal.txt");
    std::fs::write(&input, "Aggregate Nominal Amount: EUR 500,000,000\n").unwrap();

    prospex()
        .arg("process")
        .arg(&input)
        .arg("--format")
        .arg("csv")
        .assert()
        .success()
        .stdout(predicate::str::contains("document_id,issuer,banks"))
        .stdout(predicate::str::contains("500000000"));
}

#[test]
fn test_batch_with_summary() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    std::fs::write(
        dir.path().join("a.txt"),
        "Joint Lead Managers: BNP Paribas\nAggregate Nominal Amount: EUR 100,000,000\n",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("b.txt"),
        "Bookrunners: UBS AG\nAggregate Nominal Amount: USD 200,000,000\n",
    )
    .unwrap();

    prospex()
        .arg("batch")
        .arg(format!("{}/*.txt", dir.path().display()))
        .arg("--output-dir")
        .arg(&out)
        .arg("--summary")
        .assert()
        .success();

    assert!(out.join("a.json").exists());
    assert!(out.join("b.json").exists());
    let summary = std::fs::read_to_string(out.join("summary.csv")).unwrap();
    assert!(summary.contains("BNP Paribas"));
    assert!(summary.contains("UBS AG"));
}

#[test]
fn test_config_init_and_show() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prospex.json");

    prospex()
        .arg("config")
        .arg("init")
        .arg("--output")
        .arg(&path)
        .assert()
        .success();

    prospex()
        .arg("config")
        .arg("show")
        .arg("--path")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("fuzzy_threshold"));
}

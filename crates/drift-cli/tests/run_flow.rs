//! Integration tests for the gitdrift binary.
//!
//! The full-run test needs both `git` and `python3` on the path and skips
//! itself otherwise; the argument and configuration failure tests run
//! everywhere.

mod common;

use std::fs;
use std::path::Path;
use std::process::Command;

use predicates::prelude::*;
use tempfile::TempDir;

use common::gitdrift_cmd;

fn tool_available(tool: &str) -> bool {
    Command::new(tool)
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) {
    let out = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git should run");
    assert!(out.status.success(), "git {args:?} failed");
}

/// Minimal trivial embedding collaborator: one zero point per matrix row.
const STUB_EMBEDDING_SCRIPT: &str = r#"
import json, sys
with open(sys.argv[1]) as f:
    matrix = json.load(f)
with open(sys.argv[3], "w") as f:
    for _ in matrix:
        f.write("0.0;0.0;0.0\n")
"#;

#[test]
fn test_help_lists_options() {
    gitdrift_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--input-repository"))
        .stdout(predicate::str::contains("--threads"))
        .stdout(predicate::str::contains("--symmetry"));
}

#[test]
fn test_missing_config_file_fails() {
    let temp = TempDir::new().unwrap();
    gitdrift_cmd()
        .arg(temp.path().join("missing.yaml"))
        .arg("--input-repository")
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not load configuration"));
}

#[test]
fn test_config_without_report_format_fails() {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("drift.yaml");
    fs::write(&config, "json_report: false\nhtml_report: false\n").unwrap();

    gitdrift_cmd()
        .arg(&config)
        .arg("--input-repository")
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("report format"));
}

#[test]
fn test_input_repository_is_required() {
    gitdrift_cmd().arg("drift.yaml").assert().failure();
}

#[test]
fn test_full_run_writes_report_and_log() {
    if !tool_available("git") || !tool_available("python3") {
        eprintln!("git or python3 not available, skipping");
        return;
    }

    let repo = TempDir::new().unwrap();
    git(repo.path(), &["init", "-q", "-b", "main"]);
    git(repo.path(), &["config", "user.name", "tester"]);
    git(repo.path(), &["config", "user.email", "tester@example.invalid"]);
    fs::write(repo.path().join("file.txt"), "one\ntwo\n").unwrap();
    git(repo.path(), &["add", "--all"]);
    git(repo.path(), &["commit", "-q", "-m", "base"]);
    git(repo.path(), &["checkout", "-q", "-b", "feature"]);
    fs::write(repo.path().join("file.txt"), "one\ntwo\nthree\n").unwrap();
    git(repo.path(), &["commit", "-q", "-am", "extend"]);
    git(repo.path(), &["checkout", "-q", "main"]);

    let support = TempDir::new().unwrap();
    let config = support.path().join("drift.yaml");
    fs::write(
        &config,
        "json_report: true\nhtml_report: false\nreport_identifier: \"cli test\"\n",
    )
    .unwrap();
    let script = support.path().join("embed.py");
    fs::write(&script, STUB_EMBEDDING_SCRIPT).unwrap();

    let report_dir = TempDir::new().unwrap();
    let working_dir = TempDir::new().unwrap();

    gitdrift_cmd()
        .arg(&config)
        .arg("--input-repository")
        .arg(repo.path())
        .arg("--working-dir")
        .arg(working_dir.path())
        .arg("--report-dir")
        .arg(report_dir.path())
        .arg("--embedding-script")
        .arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("cli test"))
        .stdout(predicate::str::contains("line drift"));

    let entries: Vec<_> = fs::read_dir(report_dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert!(entries.iter().any(|n| n.ends_with(".json")), "{entries:?}");
    assert!(entries.iter().any(|n| n.ends_with(".log")), "{entries:?}");

    let json_name = entries.iter().find(|n| n.ends_with(".json")).unwrap();
    let json = fs::read_to_string(report_dir.path().join(json_name)).unwrap();
    let report: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(report["reportTitle"], "cli test");
    assert_eq!(report["numberOfBranchesTotal"], 2);
    assert_eq!(report["sortedBranchList"][0], "feature");
    assert_eq!(report["sortedBranchList"][1], "main");
}

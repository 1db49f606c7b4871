//! Integration tests for the `pola-caption` binary.
//!
//! Every test points `--config-file` at a scratch path so the per-user config
//! never leaks in, and uses `--dry-run` or a stand-in `convert` so ImageMagick
//! is not needed.

#![allow(deprecated)] // cargo_bin is deprecated upstream with no stable replacement yet

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn pola(config_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pola-caption").expect("binary 'pola-caption' should be built");
    cmd.arg("--config-file")
        .arg(config_dir.join("config.toml"))
        .env_remove("RUST_LOG");
    cmd
}

fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent");
    }
    fs::write(path, b"jpg").expect("write file");
}

#[test]
fn help_lists_options() {
    let temp = tempdir().expect("tempdir");
    pola(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--src"))
        .stdout(predicate::str::contains("--dest"))
        .stdout(predicate::str::contains("--text-size"))
        .stdout(predicate::str::contains("--bottom-margin"))
        .stdout(predicate::str::contains("--max-workers"));
}

#[test]
fn missing_source_exits_non_zero() {
    let temp = tempdir().expect("tempdir");
    pola(temp.path())
        .arg("--src")
        .arg(temp.path().join("missing"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot read source directory"));
}

#[test]
fn dry_run_logs_captions_and_writes_nothing() {
    let temp = tempdir().expect("tempdir");
    let photos = temp.path().join("photos");
    touch(&photos.join("2023-01-01_10-00-00-pola.jpg"));
    touch(&photos.join("notadate.jpg"));

    pola(temp.path())
        .arg("--src")
        .arg(&photos)
        .args(["--location", "Paris", "--dry-run"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Paris, 1er janvier 2023"))
        .stderr(predicate::str::contains("invalid date for file notadate.jpg"));

    assert!(!photos.join("ready").exists());
}

#[test]
fn json_summary_counts_outcomes() {
    let temp = tempdir().expect("tempdir");
    let photos = temp.path().join("photos");
    touch(&photos.join("2023-03-15_10-00-00-pola.jpg"));
    touch(&photos.join("Lyon").join("2023-05-02_10-00-00-pola.jpg"));
    touch(&photos.join("notadate.jpg"));
    touch(&photos.join("2023-03-15_10-00-00-pola.png"));

    let output = pola(temp.path())
        .arg("--src")
        .arg(&photos)
        .args(["--dry-run", "--json", "--quiet"])
        .output()
        .expect("run binary");
    assert!(output.status.success());

    let summary: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout must be JSON");
    assert_eq!(summary["annotated"], 2);
    assert_eq!(summary["skipped_date"], 1);
    assert_eq!(summary["skipped_extension"], 1);
    assert_eq!(summary["directories_scanned"], 2);
}

#[test]
fn invalid_format_exits_non_zero() {
    let temp = tempdir().expect("tempdir");
    pola(temp.path())
        .arg("--src")
        .arg(temp.path())
        .args(["--format", "%v only"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --format value"));
}

#[cfg(unix)]
#[test]
fn failing_convert_is_logged_not_fatal() {
    let temp = tempdir().expect("tempdir");
    let photos = temp.path().join("photos");
    touch(&photos.join("2023-03-15_10-00-00-pola.jpg"));

    pola(temp.path())
        .arg("--src")
        .arg(&photos)
        .args(["--convert-bin", "false", "--use-goroutine", "--max-goroutines", "2"])
        .assert()
        .success()
        .stderr(predicate::str::contains("annotation failed"))
        .stderr(predicate::str::contains("failed=1"));

    assert!(photos.join("ready").is_dir());
}

#[test]
fn config_init_then_show() {
    let temp = tempdir().expect("tempdir");
    pola(temp.path()).args(["config", "init"]).assert().success();
    assert!(temp.path().join("config.toml").exists());

    pola(temp.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("font = \"Arial\""))
        .stdout(predicate::str::contains("max_workers = 10"));
}

//! Concurrency tests for liftloop.
//!
//! These tests verify that multiple processes sharing one store:
//! - Never lose each other's writes (exclusive update lock)
//! - Never observe a half-written store (atomic replace)

use assert_cmd::Command;
use std::thread;
use tempfile::TempDir;

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn cli(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("liftloop"));
    cmd.env("XDG_CONFIG_HOME", temp_dir.path().join("config"))
        .arg("--data-dir")
        .arg(temp_dir.path().join("data"));
    cmd
}

fn instance_count(temp_dir: &TempDir) -> usize {
    let contents = std::fs::read_to_string(temp_dir.path().join("data").join("store.json"))
        .expect("Failed to read store");
    let store: serde_json::Value = serde_json::from_str(&contents).expect("Store is not valid JSON");
    store["instances"].as_array().map(Vec::len).unwrap_or(0)
}

#[test]
fn test_parallel_playthroughs_keep_every_instance() {
    let temp_dir = setup_test_dir();
    cli(&temp_dir).arg("seed").assert().success();

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                cli(&temp_dir)
                    .args(["start", "daily stretch", "--auto"])
                    .assert()
                    .success();
            });
        }
    });

    assert_eq!(instance_count(&temp_dir), 4);
}

#[test]
fn test_reads_during_writes() {
    let temp_dir = setup_test_dir();
    cli(&temp_dir).arg("seed").assert().success();

    thread::scope(|scope| {
        scope.spawn(|| {
            for _ in 0..3 {
                cli(&temp_dir)
                    .args(["start", "daily stretch", "--auto"])
                    .assert()
                    .success();
            }
        });
        scope.spawn(|| {
            for _ in 0..5 {
                cli(&temp_dir).arg("past").assert().success();
            }
        });
    });

    assert_eq!(instance_count(&temp_dir), 3);
}

#[test]
fn test_parallel_seeds_do_not_duplicate() {
    let temp_dir = setup_test_dir();

    thread::scope(|scope| {
        for _ in 0..3 {
            scope.spawn(|| {
                cli(&temp_dir).arg("seed").assert().success();
            });
        }
    });

    let contents = std::fs::read_to_string(temp_dir.path().join("data").join("store.json")).unwrap();
    let store: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(store["definitions"].as_array().unwrap().len(), 3);
}

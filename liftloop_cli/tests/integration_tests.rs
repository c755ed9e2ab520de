//! Integration tests for the liftloop binary.
//!
//! These tests verify end-to-end behavior including:
//! - Seeding and listing definitions and cycles
//! - Scripted (--auto) and interactive playthroughs
//! - Resuming a partially played workout
//! - Workout maintenance and exercise history export

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::TempDir;

/// Helper to create a test directory holding both config and data
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// CLI isolated from the user's config and data
fn cli(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("liftloop"));
    cmd.env("XDG_CONFIG_HOME", temp_dir.path().join("config"))
        .arg("--data-dir")
        .arg(temp_dir.path().join("data"));
    cmd
}

fn seed(temp_dir: &TempDir) {
    cli(temp_dir).arg("seed").assert().success();
}

fn read_store(temp_dir: &TempDir) -> Value {
    let contents = fs::read_to_string(temp_dir.path().join("data").join("store.json"))
        .expect("Failed to read store");
    serde_json::from_str(&contents).expect("Store is not valid JSON")
}

fn definition_id(store: &Value, name: &str) -> String {
    store["definitions"]
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["name"] == name)
        .and_then(|d| d["id"].as_str())
        .unwrap_or_else(|| panic!("no definition named {}", name))
        .to_string()
}

fn only_instance(store: &Value) -> &Value {
    let instances = store["instances"].as_array().unwrap();
    assert_eq!(instances.len(), 1);
    &instances[0]
}

#[test]
fn test_cli_help() {
    let temp_dir = setup_test_dir();
    cli(&temp_dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Guided workout playthroughs from the terminal",
        ));
}

#[test]
fn test_seed_is_idempotent() {
    let temp_dir = setup_test_dir();

    cli(&temp_dir)
        .arg("seed")
        .assert()
        .success()
        .stdout(predicate::str::contains("Added 3 workout definitions"));
    cli(&temp_dir)
        .arg("seed")
        .assert()
        .success()
        .stdout(predicate::str::contains("already seeded"));

    let store = read_store(&temp_dir);
    assert_eq!(store["definitions"].as_array().unwrap().len(), 3);
}

#[test]
fn test_empty_store_lists_nothing() {
    let temp_dir = setup_test_dir();

    cli(&temp_dir)
        .arg("definitions")
        .assert()
        .success()
        .stdout(predicate::str::contains("Run `liftloop seed` first"));
}

#[test]
fn test_definitions_listed_after_seed() {
    let temp_dir = setup_test_dir();
    seed(&temp_dir);

    cli(&temp_dir)
        .arg("definitions")
        .assert()
        .success()
        .stdout(predicate::str::contains("upper-body push"))
        .stdout(predicate::str::contains("lower-body"))
        .stdout(predicate::str::contains("never finished"));
}

#[test]
fn test_auto_playthrough_finishes_workout() {
    let temp_dir = setup_test_dir();
    seed(&temp_dir);

    cli(&temp_dir)
        .args(["start", "daily stretch", "--auto"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[1/5] single leg knee tuck - left side"))
        .stdout(predicate::str::contains("[5/5] cat camel"))
        .stdout(predicate::str::contains("Workout finished: daily stretch"));

    let store = read_store(&temp_dir);
    let instance = only_instance(&store);
    assert!(instance["started"].is_string());
    assert!(instance["finished"].is_string());
    let exercises = instance["exercise_instances"].as_array().unwrap();
    assert_eq!(exercises.len(), 5);
    assert!(exercises.iter().all(|e| e["finished"].is_string()));
}

#[test]
fn test_cycle_next_up_moves_after_finishing() {
    let temp_dir = setup_test_dir();
    seed(&temp_dir);
    let store = read_store(&temp_dir);
    let push_id = definition_id(&store, "upper-body push");
    let legs_id = definition_id(&store, "lower-body");

    cli(&temp_dir)
        .arg("cycles")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("→ {}  upper-body push", push_id)));

    cli(&temp_dir)
        .args(["start", &push_id, "--auto"])
        .assert()
        .success();

    cli(&temp_dir)
        .arg("cycles")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("→ {}  lower-body", legs_id)));
}

#[test]
fn test_interactive_advance_then_resume() {
    let temp_dir = setup_test_dir();
    seed(&temp_dir);

    // Enter twice: get ready -> go -> next exercise, then leave
    cli(&temp_dir)
        .args(["start", "daily stretch"])
        .write_stdin("\n\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Left the playthrough"));

    let store = read_store(&temp_dir);
    let instance = only_instance(&store);
    let exercises = instance["exercise_instances"].as_array().unwrap();
    assert!(exercises[0]["finished"].is_string());
    assert!(exercises[1]["finished"].is_null());
    assert!(instance["finished"].is_null());
    let instance_id = instance["id"].as_str().unwrap().to_string();

    cli(&temp_dir)
        .args(["past", "--incomplete"])
        .assert()
        .success()
        .stdout(predicate::str::contains(instance_id.as_str()));

    // Picks up after the finished exercise
    cli(&temp_dir)
        .args(["play", &instance_id, "--auto"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[2/5]"))
        .stdout(predicate::str::contains("[1/5]").not());
}

#[test]
fn test_weight_edit_reaches_both_sides() {
    let temp_dir = setup_test_dir();
    seed(&temp_dir);

    cli(&temp_dir)
        .args(["start", "upper-body push"])
        .write_stdin("w 20\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("weight (lbs) updated"));

    let store = read_store(&temp_dir);
    let exercises = only_instance(&store)["exercise_instances"]
        .as_array()
        .unwrap()
        .clone();
    // Left and right lower back stretch share the edit; the lat stretch doesn't
    assert_eq!(exercises[0]["weight_lbs"], 20.0);
    assert_eq!(exercises[1]["weight_lbs"], 20.0);
    assert!(exercises[2]["weight_lbs"].is_null());
}

/// Exercise instances of a slot, keyed by set iteration
fn instances_of_slot<'a>(instance: &'a Value, block: usize, slot: usize) -> Vec<&'a Value> {
    let slot_id = &instance["definition"]["blocks"][block]["exercises"][slot]["id"];
    let mut found: Vec<&Value> = instance["exercise_instances"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| &e["slot_id"] == slot_id)
        .collect();
    found.sort_by_key(|e| e["set_iteration"].as_u64());
    found
}

#[test]
fn test_set_on_unfinished_exercise_reaches_later_sets() {
    let temp_dir = setup_test_dir();
    seed(&temp_dir);
    cli(&temp_dir)
        .args(["start", "upper-body push"])
        .write_stdin("q\n")
        .assert()
        .success();
    let store = read_store(&temp_dir);
    // Bench press, set 2 of 3
    let bench = instances_of_slot(only_instance(&store), 2, 0);
    let target = bench[1]["id"].as_str().unwrap().to_string();

    cli(&temp_dir)
        .args(["set", &target, "limit", "10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("limit updated"))
        .stdout(predicate::str::contains("10 Reps"));

    let store = read_store(&temp_dir);
    let limits: Vec<_> = instances_of_slot(only_instance(&store), 2, 0)
        .iter()
        .map(|e| e["limit_value"].as_f64().unwrap())
        .collect();
    assert_eq!(limits, vec![8.0, 10.0, 10.0]);
}

#[test]
fn test_set_on_finished_exercise_changes_only_it() {
    let temp_dir = setup_test_dir();
    seed(&temp_dir);
    cli(&temp_dir)
        .args(["start", "daily stretch", "--auto"])
        .assert()
        .success();
    let store = read_store(&temp_dir);
    let left = instances_of_slot(only_instance(&store), 0, 0)[0]["id"]
        .as_str()
        .unwrap()
        .to_string();

    cli(&temp_dir)
        .args(["set", &left, "weight", "15"])
        .assert()
        .success();
    cli(&temp_dir)
        .args(["set", &left, "notes", "hip pinched"])
        .assert()
        .success();

    let store = read_store(&temp_dir);
    let instance = only_instance(&store);
    let left = instances_of_slot(instance, 0, 0)[0];
    let right = instances_of_slot(instance, 0, 1)[0];
    assert_eq!(left["weight_lbs"], 15.0);
    assert_eq!(left["description"], "hip pinched");
    assert!(right["weight_lbs"].is_null());
    assert!(right["description"].is_null());
}

#[test]
fn test_set_rejects_bad_amount() {
    let temp_dir = setup_test_dir();
    seed(&temp_dir);
    cli(&temp_dir)
        .args(["start", "daily stretch"])
        .write_stdin("q\n")
        .assert()
        .success();
    let store = read_store(&temp_dir);
    let target = only_instance(&store)["exercise_instances"][0]["id"]
        .as_str()
        .unwrap()
        .to_string();

    cli(&temp_dir)
        .args(["set", &target, "weight", "heavy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Expected a non-negative number"));
}

#[test]
fn test_definition_shows_blocks_and_slots() {
    let temp_dir = setup_test_dir();
    seed(&temp_dir);

    cli(&temp_dir)
        .args(["definition", "daily stretch"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stretch (1 Set)"))
        .stdout(predicate::str::contains(
            "- single leg knee tuck - left side: 15 Seconds",
        ))
        .stdout(predicate::str::contains("never finished"));
}

#[test]
fn test_bad_command_keeps_playing() {
    let temp_dir = setup_test_dir();
    seed(&temp_dir);

    cli(&temp_dir)
        .args(["start", "daily stretch"])
        .write_stdin("w lots\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Expected a non-negative number"));
}

#[test]
fn test_show_notes_and_finish() {
    let temp_dir = setup_test_dir();
    seed(&temp_dir);
    cli(&temp_dir)
        .args(["start", "daily stretch"])
        .write_stdin("q\n")
        .assert()
        .success();
    let store = read_store(&temp_dir);
    let instance_id = only_instance(&store)["id"].as_str().unwrap().to_string();

    cli(&temp_dir)
        .args(["show", &instance_id])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Set 1 - single leg knee tuck - left side: 15 Seconds",
        ))
        .stdout(predicate::str::contains("not finished"));

    cli(&temp_dir)
        .args(["notes", &instance_id, "tight hips today"])
        .assert()
        .success()
        .stdout(predicate::str::contains("notes: tight hips today"));

    cli(&temp_dir)
        .args(["finish", &instance_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Marked finished"));

    // Already finished
    cli(&temp_dir)
        .args(["finish", &instance_id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not in progress"));
}

#[test]
fn test_history_with_csv_export() {
    let temp_dir = setup_test_dir();
    seed(&temp_dir);
    for _ in 0..2 {
        cli(&temp_dir)
            .args(["start", "daily stretch", "--auto"])
            .assert()
            .success();
    }
    let store = read_store(&temp_dir);
    let exercise_id = store["instances"][1]["exercise_instances"][0]["id"]
        .as_str()
        .unwrap()
        .to_string();
    let csv_path = temp_dir.path().join("knee_tuck.csv");

    cli(&temp_dir)
        .args(["history", &exercise_id, "--csv"])
        .arg(&csv_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("single leg knee tuck - left side"))
        .stdout(predicate::str::contains("Wrote 2 rows"));

    let csv = fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "finished,exercise,variants,limit_type,limit_value,weight_lbs,notes"
    );
    assert_eq!(lines.len(), 3);
}

#[test]
fn test_unknown_instance_fails() {
    let temp_dir = setup_test_dir();
    seed(&temp_dir);

    cli(&temp_dir)
        .args(["play", "00000000-0000-0000-0000-000000000000", "--auto"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found"));
}

#[test]
fn test_invalid_id_rejected_by_parser() {
    let temp_dir = setup_test_dir();

    cli(&temp_dir)
        .args(["show", "not-a-uuid"])
        .assert()
        .failure();
}

//! Integration tests for the tm binary

use std::path::Path;

use assert_cmd::cargo;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Command for the tm binary pointed at `db`, with colour off.
fn tm(db: &Path) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("tm"));
    cmd.env_remove("TASKMAN_DB").env_remove("RUST_LOG").arg("--no-color").arg("--db").arg(db);
    cmd
}

fn stored(db: &Path) -> Vec<serde_json::Value> {
    let raw = std::fs::read_to_string(db).unwrap();
    serde_json::from_str(&raw).unwrap()
}

#[test]
fn test_help() {
    let temp = TempDir::new().unwrap();
    tm(&temp.path().join("tasks.json"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: tm").and(predicate::str::contains("--db")));
}

#[test]
fn test_add_list_complete_delete() {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("tasks.json");

    tm(&db)
        .args(["add", "Buy", "milk", "--priority", "high", "--tag", "errand"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added task").and(predicate::str::contains("Buy milk")));

    let tasks = stored(&db);
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["status"], "PENDING");
    assert_eq!(tasks[0]["priority"], "HIGH");
    assert!(tasks[0].get("description").is_none());
    let id = tasks[0]["id"].as_str().unwrap().to_string();

    tm(&db)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("Buy milk [errand]"));

    tm(&db)
        .args(["complete", &id[..8]])
        .assert()
        .success()
        .stdout(predicate::str::contains("is now Completed"));
    let tasks = stored(&db);
    assert_eq!(tasks[0]["status"], "COMPLETED");
    assert!(tasks[0]["completedAt"].is_string());

    // Closed tasks are hidden unless asked for.
    tm(&db).arg("list").assert().success().stdout(predicate::str::contains("No tasks found."));
    tm(&db)
        .args(["list", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Buy milk"));

    tm(&db).args(["delete", id.as_str()]).assert().success().stdout(predicate::str::contains("Deleted task"));
    assert!(stored(&db).is_empty());
}

#[test]
fn test_show_by_title() {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("tasks.json");
    tm(&db).args(["add", "Water plants", "--desc", "balcony first"]).assert().success();

    tm(&db)
        .args(["show", "water plants"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Title:       Water plants").and(predicate::str::contains("balcony first")));
}

#[test]
fn test_unknown_id_fails() {
    let temp = TempDir::new().unwrap();
    tm(&temp.path().join("tasks.json"))
        .args(["complete", "nonexistent-id"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("task with id 'nonexistent-id' not found"));
}

#[test]
fn test_blank_id_fails_validation() {
    let temp = TempDir::new().unwrap();
    tm(&temp.path().join("tasks.json"))
        .args(["delete", ""])
        .assert()
        .failure()
        .stderr(predicate::str::contains("task id cannot be empty"));
}

#[test]
fn test_overlong_title_is_not_stored() {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("tasks.json");
    tm(&db)
        .args(["add", "x".repeat(101).as_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("title cannot exceed 100 characters"));
    assert!(!db.exists());
}

#[test]
fn test_edit_and_tags() {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("tasks.json");
    tm(&db).args(["add", "Plan trip", "--category", "travel", "--tag", "summer"]).assert().success();

    tm(&db)
        .args(["edit", "plan trip", "--clear-category", "--add-tag", "family,Summer", "--due", "2030-06-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated task"));

    let tasks = stored(&db);
    assert!(tasks[0].get("category").is_none());
    assert_eq!(tasks[0]["dueDate"], "2030-06-01");
    assert_eq!(tasks[0]["tags"], serde_json::json!(["summer", "family"]));

    tm(&db)
        .arg("tags")
        .assert()
        .success()
        .stdout(predicate::str::contains("family").and(predicate::str::contains("summer")));
}

#[test]
fn test_shell_session() {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("tasks.json");
    tm(&db)
        .write_stdin("add \"Call mum\" --due tomorrow\nbogus\nlist\nexit\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("TASK MANAGER")
                .and(predicate::str::contains("Unknown command: bogus"))
                .and(predicate::str::contains("Call mum"))
                .and(predicate::str::contains("Goodbye!")),
        );
    assert_eq!(stored(&db).len(), 1);
}

#[test]
fn test_stats_and_extra_fields() {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("tasks.json");
    tm(&db)
        .args(["add", "Fix gate", "--estimate", "3", "--assignee", "lee", "--project", "yard"])
        .assert()
        .success();
    tm(&db).args(["add", "Oil hinges"]).assert().success();
    tm(&db).args(["edit", "fix gate", "--progress", "100", "--notes", "done early"]).assert().success();

    let tasks = stored(&db);
    let gate = tasks.iter().find(|t| t["title"] == "Fix gate").unwrap();
    assert_eq!(gate["status"], "COMPLETED");
    assert_eq!(gate["progressPercentage"], 100);
    assert_eq!(gate["estimatedHours"], 3);
    assert_eq!(gate["assignedTo"], "lee");
    assert_eq!(gate["projectId"], "yard");
    assert_eq!(gate["notes"], "done early");

    tm(&db)
        .arg("stats")
        .assert()
        .success()
        .stdout(predicate::str::contains("Total Tasks:     2").and(predicate::str::contains("Completion Rate: 50.0%")));
}

#[test]
fn test_shutdown_log_reports_task_count() {
    let temp = TempDir::new().unwrap();
    let db = temp.path().join("tasks.json");
    tm(&db).args(["add", "Logged"]).assert().success();
    tm(&db)
        .args(["-v", "list"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Shutting down").and(predicate::str::contains("tasks=1")));
}

#[test]
fn test_completions() {
    let temp = TempDir::new().unwrap();
    tm(&temp.path().join("tasks.json"))
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_tm()"));
}

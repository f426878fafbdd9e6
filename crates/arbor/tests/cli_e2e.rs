#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn arbor(data: &Path) -> Command {
    let mut cmd = Command::new(cargo_bin("arbor"));
    cmd.arg("--data")
        .arg(data)
        .env_remove("ARBOR_DATA")
        .env_remove("ARBOR_LOG")
        .current_dir(data);
    cmd
}

fn add(data: &Path, args: &[&str]) {
    arbor(data).arg("add").args(args).assert().success();
}

#[test]
fn test_empty_outline_shows_placeholder() {
    let temp = TempDir::new().unwrap();
    arbor(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to show."));
    assert!(!temp.path().join("tree.json").exists());
}

#[test]
fn test_add_and_show_nested_rows() {
    let temp = TempDir::new().unwrap();
    add(temp.path(), &["-k", "parallel", "home"]);
    add(temp.path(), &["-u", "1", "-k", "todo", "-t", "errand", "buy", "milk"]);
    add(temp.path(), &["work"]);

    arbor(temp.path())
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("1. ⇉ home"))
        .stdout(predicate::str::contains("  1.1. ☐ buy milk  :errand"))
        .stdout(predicate::str::contains("2. • work"));

    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(temp.path().join("tree.json")).unwrap()).unwrap();
    assert_eq!(saved["version"], 3);
    assert_eq!(saved["root"]["children"][0]["children"][0]["text"], "buy milk");
}

#[test]
fn test_tag_filter_hides_other_rows() {
    let temp = TempDir::new().unwrap();
    add(temp.path(), &["-k", "todo", "-t", "work", "A"]);
    add(temp.path(), &["-t", "home", "B"]);
    add(temp.path(), &["-u", "1", "-k", "done", "C"]);

    arbor(temp.path())
        .args(["show", "--tag", "work"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1. ☐ A"))
        .stdout(predicate::str::contains("B").not())
        .stdout(predicate::str::contains("C").not());

    arbor(temp.path())
        .args(["show", "-q", "t=d"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1.1. ☑ C"));
}

#[test]
fn test_move_into_own_subtree_fails_and_changes_nothing() {
    let temp = TempDir::new().unwrap();
    add(temp.path(), &["parent"]);
    add(temp.path(), &["-u", "1", "child"]);
    let before = fs::read_to_string(temp.path().join("tree.json")).unwrap();

    arbor(temp.path())
        .args(["mv", "1", "-u", "1.1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("its own ancestor"));

    let after = fs::read_to_string(temp.path().join("tree.json")).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_delete_drops_bookmarks() {
    let temp = TempDir::new().unwrap();
    add(temp.path(), &["keep"]);
    add(temp.path(), &["drop"]);
    arbor(temp.path())
        .args(["bookmark", "add", "1"])
        .assert()
        .success();
    arbor(temp.path())
        .args(["bookmark", "add", "2", "doomed"])
        .assert()
        .success();

    arbor(temp.path()).args(["rm", "2"]).assert().success();

    arbor(temp.path())
        .args(["bookmark"])
        .assert()
        .success()
        .stdout(predicate::str::contains("keep"))
        .stdout(predicate::str::contains("doomed").not());
}

#[test]
fn test_toggle_and_set() {
    let temp = TempDir::new().unwrap();
    add(temp.path(), &["-k", "todo", "task"]);

    arbor(temp.path())
        .args(["toggle", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("is now done"));

    arbor(temp.path())
        .args(["set", "1", "color", "red"])
        .assert()
        .success();
    arbor(temp.path())
        .args(["set", "1", "estimate", "-5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("estimate"));

    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(temp.path().join("tree.json")).unwrap()).unwrap();
    let row = &saved["root"]["children"][0];
    assert_eq!(row["type"], "done");
    assert_eq!(row["color"], "red");
}

#[test]
fn test_export_import_round_trip() {
    let source = TempDir::new().unwrap();
    add(source.path(), &["-t", "x", "exported"]);
    let out = source.path().join("dump.json");
    arbor(source.path())
        .args(["export", "-o"])
        .arg(&out)
        .assert()
        .success();

    let target = TempDir::new().unwrap();
    arbor(target.path())
        .arg("import")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 1 rows"));
    arbor(target.path())
        .arg("tags")
        .assert()
        .success()
        .stdout(predicate::str::contains(":x"));
}

#[test]
fn test_malformed_document_is_an_error() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("tree.json"), "[1, 2").unwrap();
    arbor(temp.path())
        .arg("show")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed document"));
    assert_eq!(
        fs::read_to_string(temp.path().join("tree.json")).unwrap(),
        "[1, 2"
    );
}

#[test]
fn test_config_set_and_get() {
    let temp = TempDir::new().unwrap();
    arbor(temp.path())
        .args(["config", "backup_interval_minutes", "15"])
        .assert()
        .success();
    arbor(temp.path())
        .args(["config", "backup_interval_minutes"])
        .assert()
        .success()
        .stdout("15\n");
    assert!(temp.path().join("arbor.toml").exists());
}

#[test]
fn test_backup_command_writes_into_backup_folder() {
    let temp = TempDir::new().unwrap();
    add(temp.path(), &["saved"]);
    arbor(temp.path())
        .arg("backup")
        .assert()
        .success()
        .stdout(predicate::str::contains("Backup written"));
    let backups: Vec<_> = fs::read_dir(temp.path().join("backups"))
        .unwrap()
        .collect();
    assert_eq!(backups.len(), 1);
}

#[test]
fn test_plan_lists_rows_by_level() {
    let temp = TempDir::new().unwrap();
    add(temp.path(), &["-k", "todo", "water plants"]);
    add(temp.path(), &["-k", "todo", "pay rent"]);
    add(temp.path(), &["read"]);

    arbor(temp.path()).args(["plan", "2", "1"]).assert().success();
    arbor(temp.path()).args(["plan", "1", "1"]).assert().success();
    arbor(temp.path())
        .args(["plan", "1", "--up"])
        .assert()
        .success();

    arbor(temp.path())
        .arg("plan")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "1 now\n  1. ☐ water plants\n  2. ☐ pay rent\n",
        ))
        .stdout(predicate::str::contains("read").not());

    let saved: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(temp.path().join("tree.json")).unwrap()).unwrap();
    assert_eq!(saved["root"]["children"][0]["planned"]["level"], 1);
    assert!(saved["root"]["children"][2].get("planned").is_none());
}

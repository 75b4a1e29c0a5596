//! CLI integration tests over a snapshot-backed export.

use assert_cmd::Command;
use chrono::{Duration, Utc};
use predicates::prelude::*;
use revex_testing::fixtures::{revision, work_item, write_snapshot};
use serde_json::json;
use tempfile::TempDir;

fn revex() -> Command {
    Command::cargo_bin("revex").unwrap()
}

#[test]
fn test_export_status_show_roundtrip() {
    let dir = TempDir::new().unwrap();
    let storage = dir.path().join("storage");
    let snapshot = dir.path().join("items.jsonl");
    let progress_csv = dir.path().join("progress.csv");

    // The chunker walks back from the wall clock, so items must be recent.
    let now = Utc::now();
    let items = vec![work_item(
        101,
        now - Duration::days(2),
        vec![
            revision(
                0,
                now - Duration::days(2),
                &[("System.Title", json!("First"))],
            ),
            revision(
                1,
                now - Duration::days(1),
                &[("System.Title", json!("Renamed"))],
            ),
        ],
    )];
    write_snapshot(&snapshot, &items).unwrap();

    revex()
        .args(["export", "--project", "Phoenix", "--quiet"])
        .arg("--snapshot")
        .arg(&snapshot)
        .arg("--storage")
        .arg(&storage)
        .arg("--progress-csv")
        .arg(&progress_csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported 1 items (2 revisions"));

    let csv_content = std::fs::read_to_string(&progress_csv).unwrap();
    assert!(csv_content.starts_with("total_items,items_processed"));

    // A second run fast-skips everything: same revisions, zero new fields.
    revex()
        .args(["export", "--project", "Phoenix", "--quiet"])
        .arg("--snapshot")
        .arg(&snapshot)
        .arg("--storage")
        .arg(&storage)
        .assert()
        .success()
        .stdout(predicate::str::contains("(2 revisions, 0 fields)"));

    revex()
        .arg("status")
        .arg("--storage")
        .arg(&storage)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 items exported"))
        .stdout(predicate::str::contains("watermark 1"));

    revex()
        .args(["show", "101", "--revision", "1"])
        .arg("--storage")
        .arg(&storage)
        .assert()
        .success()
        .stdout(predicate::str::contains("System.Title"))
        .stdout(predicate::str::contains("Renamed"));

    revex()
        .args(["show", "101"])
        .arg("--storage")
        .arg(&storage)
        .assert()
        .success()
        .stdout(predicate::str::contains("Exported revisions for item 101"));
}

#[test]
fn test_status_on_empty_storage() {
    let dir = TempDir::new().unwrap();
    let storage = dir.path().join("storage");

    revex()
        .arg("status")
        .arg("--storage")
        .arg(&storage)
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing exported yet"));
}

#[test]
fn test_export_rejects_malformed_snapshot() {
    let dir = TempDir::new().unwrap();
    let storage = dir.path().join("storage");
    let snapshot = dir.path().join("items.jsonl");
    std::fs::write(&snapshot, "not json\n").unwrap();

    revex()
        .args(["export", "--project", "Phoenix", "--quiet"])
        .arg("--snapshot")
        .arg(&snapshot)
        .arg("--storage")
        .arg(&storage)
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 1"));
}

//! Tests for the `backup` CLI command

use crate::common::{assert_contains, assert_valid_json, count_rows, TestRepo};

#[test]
fn test_backup_default_name() {
    let repo = TestRepo::new();
    repo.with_riddle_game();
    repo.run_cli_success(&["scan", "--no-artifacts"]);

    let output = repo.run_cli_success(&["backup"]);
    assert_contains(&output, "Backup written to");

    let backups: Vec<_> = std::fs::read_dir(repo.backup_dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(backups.len(), 1);
    assert!(backups[0].starts_with("repository-"));
    assert!(backups[0].ends_with(".db"));

    let copy = repo.backup_dir().join(&backups[0]);
    assert_eq!(count_rows(&copy, "files"), 7);
    assert_eq!(count_rows(&copy, "functions"), 3);
}

#[test]
fn test_backup_named_json() {
    let repo = TestRepo::new();
    repo.add_file("main.js", "function main() {}\n");
    repo.scan();

    let output = repo.run_cli_success(&["backup", "--name", "nightly.db", "--format", "json"]);
    let json = assert_valid_json(&output, "backup");
    assert!(json["backup"].as_str().unwrap().ends_with("nightly.db"));
    assert!(json["size_bytes"].as_u64().unwrap() > 0);
    assert!(repo.backup_dir().join("nightly.db").exists());

    // same name twice is refused
    repo.run_cli_failure(&["backup", "--name", "nightly.db"]);
}

#[test]
fn test_backup_name_cannot_escape() {
    let repo = TestRepo::new();
    repo.add_file("main.js", "function main() {}\n");
    repo.scan();

    let (_, stderr) = repo.run_cli_failure(&["backup", "--name", "../escape.db"]);
    assert_contains(&stderr, "escapes");
    assert!(!repo.path().join(".repo-index").join("escape.db").exists());
    assert!(!repo.backup_dir().exists());

    repo.run_cli_failure(&["backup", "--name", "../../outside.db"]);
    assert!(!repo.path().join("outside.db").exists());
}

#[test]
fn test_backup_before_scan_fails() {
    let repo = TestRepo::new();
    repo.run_cli_failure(&["backup"]);
    assert!(!repo.backup_dir().exists());
}

//! Tests for the `scan` CLI command

use crate::common::{assert_contains, assert_valid_json, count_rows, TestRepo};

#[test]
fn test_scan_writes_store_and_artifacts() {
    let repo = TestRepo::new();
    repo.with_riddle_game();

    let output = repo.scan();
    assert_contains(&output, "Files:     7");
    assert_contains(&output, "Functions: 3");
    assert_contains(&output, "Errors:    0");
    assert_contains(&output, "Most complex:  js/main.js (3)");
    assert_contains(&output, "Least complex: js/ui.js (1)");

    assert!(repo.db_path().exists());
    for name in ["structure.json", "code-index.json", "metrics.json", "ARCHITECTURE.md"] {
        assert!(repo.data_dir().join(name).exists(), "{} missing", name);
    }

    let code_index = std::fs::read_to_string(repo.data_dir().join("code-index.json")).unwrap();
    let json = assert_valid_json(&code_index, "code index");
    assert_eq!(json["functions"]["loadRiddles"][0]["file"], "js/data.js");
    assert_eq!(json["exports"]["renderRiddle"][0]["file"], "js/ui.js");

    let structure = std::fs::read_to_string(repo.data_dir().join("structure.json")).unwrap();
    let json = assert_valid_json(&structure, "structure");
    assert_eq!(json["used_by"]["js/data.js"][0], "js/main.js");
}

#[test]
fn test_scan_json_summary() {
    let repo = TestRepo::new();
    repo.add_file("math.js", "function add(a,b){return a+b;}");

    let output = repo.run_cli_success(&["scan", "--format", "json", "--no-artifacts"]);
    let json = assert_valid_json(&output, "scan summary");
    assert_eq!(json["files"], 1);
    assert_eq!(json["functions"], 1);
    assert_eq!(json["repository"], "local/repository");
    assert_eq!(json["artifacts"].as_array().unwrap().len(), 0);
    assert_eq!(json["most_complex"]["path"], "math.js");
    assert_eq!(json["least_complex"]["path"], "math.js");
    assert_eq!(json["least_complex"]["complexity"], 1);
    assert!(!repo.data_dir().exists());
}

#[test]
fn test_rescan_does_not_duplicate_rows() {
    let repo = TestRepo::new();
    repo.with_riddle_game();
    repo.scan();
    let counts: Vec<i64> = ["files", "functions", "imports", "exports", "dependencies"]
        .iter()
        .map(|t| count_rows(&repo.db_path(), t))
        .collect();

    repo.scan();
    let again: Vec<i64> = ["files", "functions", "imports", "exports", "dependencies"]
        .iter()
        .map(|t| count_rows(&repo.db_path(), t))
        .collect();
    assert_eq!(counts, again);
    assert_eq!(count_rows(&repo.db_path(), "scans"), 2);
}

#[test]
fn test_scan_prune_flag() {
    let repo = TestRepo::new();
    repo.add_file("keep.js", "function keep() {}\n")
        .add_file("old.js", "function old() {}\n");
    repo.scan();

    repo.remove_file("old.js");
    repo.scan();
    assert_eq!(count_rows(&repo.db_path(), "files"), 2);

    let output = repo.run_cli_success(&["scan", "--prune"]);
    assert_contains(&output, "Pruned:    1");
    assert_eq!(count_rows(&repo.db_path(), "files"), 1);
    assert_eq!(count_rows(&repo.db_path(), "functions"), 1);
}

#[test]
fn test_incremental_scan_reports_unchanged() {
    let repo = TestRepo::new();
    repo.add_file("a.js", "function a() {}\n")
        .add_file("b.js", "function b() {}\n");
    repo.scan();

    repo.add_file("b.js", "function b() {\n  return 2;\n}\n");
    let output = repo.run_cli_success(&["scan", "--kind", "incremental"]);
    assert_contains(&output, "Unchanged: 1");
    assert_contains(&output, "Functions: 1");
}

#[test]
fn test_scan_respects_db_override() {
    let repo = TestRepo::new();
    repo.add_file("main.js", "function main() {}\n");
    let store = tempfile::TempDir::new().unwrap();
    let db = store.path().join("custom.db");

    repo.run_cli_success(&["scan", "--db", db.to_str().unwrap(), "--no-artifacts"]);
    assert!(db.exists());
    assert!(!repo.db_path().exists());

    let output = repo.run_cli_success(&["stats", "--db", db.to_str().unwrap()]);
    assert_contains(&output, "Files:      1");
}

#[test]
fn test_scan_missing_path_fails() {
    let repo = TestRepo::new();
    let (_, stderr) = repo.run_cli_failure(&["scan", "does-not-exist"]);
    assert_contains(&stderr, "File not found");
    assert!(!repo.db_path().exists());
}

//! Tests for the read-only query commands: stats, files, functions, search,
//! deps, complexity and export

use crate::common::{assert_contains, assert_not_contains, assert_valid_json, TestRepo};

fn scanned_riddle_game() -> TestRepo {
    let repo = TestRepo::new();
    repo.with_riddle_game();
    repo.run_cli_success(&["scan", "--no-artifacts"]);
    repo
}

// ============================================================================
// stats
// ============================================================================

#[test]
fn test_stats_text() {
    let repo = scanned_riddle_game();
    let output = repo.run_cli_success(&["stats"]);
    assert_contains(&output, "Repository: local/repository");
    assert_contains(&output, "Files:      7");
    assert_contains(&output, "Functions:  3 (2 exported, 2 async, 1 arrow)");
    assert_contains(&output, "Dependencies: 3 (2 resolved, 1 unresolved, 1 external imports)");
    assert_not_contains(&output, "Languages:");
}

#[test]
fn test_stats_verbose_lists_languages() {
    let repo = scanned_riddle_game();
    let output = repo.run_cli_success(&["stats", "--verbose"]);
    assert_contains(&output, "Languages:");
    assert_contains(&output, "javascript");
    assert_contains(&output, "Latest scan #1 (full, completed)");
}

#[test]
fn test_stats_json() {
    let repo = scanned_riddle_game();
    let output = repo.run_cli_success(&["stats", "--format", "json"]);
    let json = assert_valid_json(&output, "stats");
    assert_eq!(json["repository"]["owner"], "local");
    assert_eq!(json["metrics"]["files"]["total_files"], 7);
    assert_eq!(json["metrics"]["functions"]["total_functions"], 3);
    assert!(json.get("last_scan").is_none());
}

#[test]
fn test_query_before_scan_fails() {
    let repo = TestRepo::new();
    repo.add_file("main.js", "function main() {}\n");

    let (_, stderr) = repo.run_cli_failure(&["stats"]);
    assert_contains(&stderr, "Run `repo-index scan` first");
    assert!(!repo.db_path().exists());
}

// ============================================================================
// files
// ============================================================================

#[test]
fn test_files_sorted_by_lines() {
    let repo = scanned_riddle_game();
    let output = repo.run_cli_success(&["files", "--sort", "lines_count", "--format", "json"]);
    let json = assert_valid_json(&output, "files");
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 7);
    let lines: Vec<i64> = rows.iter().map(|r| r["lines_count"].as_i64().unwrap()).collect();
    assert!(lines.windows(2).all(|w| w[0] >= w[1]), "{:?}", lines);
}

#[test]
fn test_files_limit() {
    let repo = scanned_riddle_game();
    let output = repo.run_cli_success(&["files", "--limit", "2"]);
    assert_contains(&output, "2 files");
    assert_contains(&output, "README.md");
}

#[test]
fn test_files_rejects_bad_arguments() {
    let repo = scanned_riddle_game();

    let (_, stderr) = repo.run_cli_failure(&["files", "--limit", "0"]);
    assert_contains(&stderr, "limit");
    repo.run_cli_failure(&["files", "--limit", "-3"]);

    let (_, stderr) = repo.run_cli_failure(&["files", "--sort", "bogus"]);
    assert_contains(&stderr, "lines_count");

    repo.run_cli_failure(&["files", "--limit", "many"]);
}

// ============================================================================
// functions / search
// ============================================================================

#[test]
fn test_functions_filtered_by_file() {
    let repo = scanned_riddle_game();
    let output = repo.run_cli_success(&["functions", "--file", "data", "--format", "json"]);
    let json = assert_valid_json(&output, "functions");
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "loadRiddles");
    assert_eq!(rows[0]["is_async"], true);
    assert_eq!(rows[0]["is_exported"], true);

    let output = repo.run_cli_success(&["functions"]);
    assert_contains(&output, "initGame");
    assert_contains(&output, "renderRiddle");
    assert_contains(&output, "3 functions");
}

#[test]
fn test_search_finds_function() {
    let repo = scanned_riddle_game();
    let output = repo.run_cli_success(&["search", "loadRiddles"]);
    assert_contains(&output, "js/data.js:1");

    let output = repo.run_cli_success(&["s", "nothingmatchesthis"]);
    assert_contains(&output, "No matches for 'nothingmatchesthis'");
}

// ============================================================================
// deps / complexity
// ============================================================================

#[test]
fn test_deps_marks_unresolved() {
    let repo = TestRepo::new();
    repo.add_file("a.js", "import { x } from './missing.js';\nimport './b.js';\n")
        .add_file("b.js", "export const y = 1;\n");
    repo.scan();

    let output = repo.run_cli_success(&["deps"]);
    assert_contains(&output, "a.js -> b.js");
    assert_contains(&output, "a.js -> (unresolved)");
    assert_contains(&output, "2 edges (1 resolved, 1 unresolved)");

    let output = repo.run_cli_success(&["deps", "--limit", "1", "--format", "json"]);
    let json = assert_valid_json(&output, "deps");
    assert_eq!(json.as_array().unwrap().len(), 1);
}

#[test]
fn test_complexity_ranking() {
    let repo = TestRepo::new();
    repo.add_file(
        "busy.js",
        "function busy(a) {\n  if (a) {}\n  if (a && b) {}\n  for (;;) {}\n}\n",
    )
    .add_file("calm.js", "function calm() {}\n");
    repo.scan();

    let output = repo.run_cli_success(&["complexity", "--format", "json"]);
    let json = assert_valid_json(&output, "complexity");
    let rows = json.as_array().unwrap();
    assert_eq!(rows[0]["path"], "busy.js");
    assert_eq!(rows[0]["complexity_score"], 5);
    assert_eq!(rows[1]["path"], "calm.js");

    let output = repo.run_cli_success(&["complexity", "--limit", "1"]);
    assert_contains(&output, "busy.js");
    assert_not_contains(&output, "calm.js");
}

// ============================================================================
// export
// ============================================================================

#[test]
fn test_export_is_json_to_stdout() {
    let repo = scanned_riddle_game();
    let output = repo.run_cli_success(&["export", "--format", "text"]);
    let json = assert_valid_json(&output, "export");
    assert_eq!(json["repository"]["name"], "repository");
    assert_eq!(json["files"].as_array().unwrap().len(), 7);
    assert_eq!(json["dependencies"].as_array().unwrap().len(), 3);
}

#[test]
fn test_export_to_file() {
    let repo = scanned_riddle_game();
    let out = repo.path().join("out").join("index.json");
    let output = repo.run_cli_success(&["export", "--output", out.to_str().unwrap()]);
    assert_contains(&output, "Exported 7 files");

    let content = std::fs::read_to_string(&out).unwrap();
    let json = assert_valid_json(&content, "exported file");
    assert_eq!(json["metrics"]["functions"]["total_functions"], 3);
}

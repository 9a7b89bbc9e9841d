//! TestRepo builder for integration testing
//!
//! Creates a repository under a temp dir, runs the compiled `repo-index`
//! binary against it and opens the resulting store for inspection.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use repo_index::config::{ConfigOverrides, IndexConfig, RepoIdentity};
use repo_index::storage::Repository;
use repo_index::Database;
use tempfile::TempDir;

pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Create a new empty test repository
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Add a file with the given content, creating parent directories
    pub fn add_file(&self, relative_path: &str, content: &str) -> &Self {
        let full_path = self.dir.path().join(relative_path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&full_path, content).expect("Failed to write file");
        self
    }

    pub fn remove_file(&self, relative_path: &str) -> &Self {
        fs::remove_file(self.dir.path().join(relative_path)).expect("Failed to remove file");
        self
    }

    /// Default location of the store
    pub fn db_path(&self) -> PathBuf {
        self.path().join(".repo-index").join("repository.db")
    }

    /// Default artifact directory
    pub fn data_dir(&self) -> PathBuf {
        self.path().join(".repo-index").join("data")
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.path().join(".repo-index").join("backups")
    }

    /// Configuration as the CLI would resolve it, without git detection
    pub fn config(&self) -> IndexConfig {
        IndexConfig::resolve(self.path(), &ConfigOverrides::default(), |_| {
            RepoIdentity::fallback()
        })
        .expect("Failed to resolve config")
    }

    /// Open the store written by the CLI
    pub fn open_db(&self) -> Database {
        Database::open(&self.db_path()).expect("Failed to open database")
    }

    /// The single repository row in the store
    pub fn repository(&self, db: &Database) -> Repository {
        db.find_repository("local", "repository")
            .expect("Failed to query repository")
            .expect("Repository not indexed")
    }

    /// Run the repo-index binary in the repository root
    pub fn run_cli(&self, args: &[&str]) -> std::io::Result<Output> {
        Command::new(env!("CARGO_BIN_EXE_repo-index"))
            .current_dir(self.path())
            .env_remove("REPO_INDEX_DB")
            .env_remove("REPO_INDEX_DATA_DIR")
            .env_remove("RUST_LOG")
            .args(args)
            .output()
    }

    /// Run CLI and expect success, return stdout
    pub fn run_cli_success(&self, args: &[&str]) -> String {
        let output = self.run_cli(args).expect("Failed to run CLI");
        assert!(
            output.status.success(),
            "CLI command {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    /// Run CLI and expect exit status 1, return (stdout, stderr)
    pub fn run_cli_failure(&self, args: &[&str]) -> (String, String) {
        let output = self.run_cli(args).expect("Failed to run CLI");
        assert_eq!(
            output.status.code(),
            Some(1),
            "CLI command {:?} should have failed with status 1",
            args
        );
        (
            String::from_utf8_lossy(&output.stdout).to_string(),
            String::from_utf8_lossy(&output.stderr).to_string(),
        )
    }

    /// Scan the repository through the CLI
    pub fn scan(&self) -> String {
        self.run_cli_success(&["scan"])
    }

    // ========================================================================
    // PRE-BUILT REPO STRUCTURES
    // ========================================================================

    /// Small static web game: markup, styles, scripts with imports, data and docs
    pub fn with_riddle_game(&self) -> &Self {
        self.add_file(
            "index.html",
            "<!DOCTYPE html>\n<html>\n<head>\n  <title>Riddle Quest</title>\n</head>\n<body>\n  <!-- game root -->\n  <main id=\"app\"></main>\n  <script type=\"module\" src=\"js/main.js\"></script>\n</body>\n</html>\n",
        )
        .add_file(
            "css/style.css",
            "/* Layout */\nbody {\n  margin: 0;\n}\n\n.card {\n  padding: 1rem;\n}\n",
        )
        .add_file(
            "js/main.js",
            "// Entry point for the riddle game\nimport { loadRiddles } from './data.js';\nimport { renderRiddle } from './ui';\n\nasync function initGame() {\n  const riddles = await loadRiddles();\n  if (riddles.length > 0 && ready) {\n    renderRiddle(riddles[0]);\n  }\n}\n\ninitGame();\n",
        )
        .add_file(
            "js/data.js",
            "export async function loadRiddles() {\n  const response = await fetch('/data/riddles.json');\n  return response.ok ? response.json() : [];\n}\n",
        )
        .add_file(
            "js/ui.js",
            "import { escape } from 'lodash';\n\nexport const renderRiddle = (riddle) => {\n  document.getElementById('app').textContent = escape(riddle.question);\n};\n",
        )
        .add_file(
            "data/riddles.json",
            "[\n  { \"question\": \"What has keys but no locks?\", \"answer\": \"piano\" }\n]\n",
        )
        .add_file(
            "README.md",
            "# Riddle Quest\n\nA tiny riddle game.\n",
        )
    }
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}

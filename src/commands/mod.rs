//! Command modules for the repo-index CLI
//!
//! Each handler takes its `Args` struct from `cli.rs` plus the shared
//! [`CommandContext`], and returns the text to print on stdout.
//!
//! - `scan` - Walk the root, index it and write artifacts
//! - `stats` - Totals and, with `--verbose`, languages and the last scan
//! - `query` - `files`, `functions`, `search`, `deps`, `complexity`
//! - `export` - The whole index as one JSON document
//! - `backup` - Confined copy of the database

pub mod backup;
pub mod export;
pub mod query;
pub mod scan;
pub mod stats;

pub use backup::run_backup;
pub use export::run_export;
pub use query::{run_complexity, run_deps, run_files, run_functions, run_search};
pub use scan::run_scan;
pub use stats::run_stats;

use std::path::{Path, PathBuf};

use crate::cli::{Cli, OutputFormat};
use crate::config::{ConfigOverrides, IndexConfig};
use crate::error::{IndexError, Result};
use crate::storage::{Database, Repository};

/// Shared context passed to all command handlers
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub format: OutputFormat,
    pub verbose: bool,
    pub root: PathBuf,
    pub overrides: ConfigOverrides,
}

impl CommandContext {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            format: cli.format,
            verbose: cli.verbose,
            root: cli.root.clone().unwrap_or_else(|| PathBuf::from(".")),
            overrides: ConfigOverrides {
                db_path: cli.db.clone(),
                data_dir: cli.data_dir.clone(),
            },
        }
    }

    /// Resolved configuration for the context root
    pub fn config(&self) -> Result<IndexConfig> {
        self.config_for(&self.root)
    }

    pub fn config_for(&self, root: &Path) -> Result<IndexConfig> {
        IndexConfig::load(root, &self.overrides)
    }

    /// Open the existing store and the configured repository in it
    pub fn open_existing(&self, config: &IndexConfig) -> Result<(Database, Repository)> {
        let identity = &config.identity;
        let missing = || IndexError::NoRepository {
            owner: identity.owner.clone(),
            name: identity.name.clone(),
        };
        if !config.db_path.exists() {
            return Err(missing());
        }
        let db = Database::open(&config.db_path)?;
        let repository = db
            .find_repository(&identity.owner, &identity.name)?
            .ok_or_else(missing)?;
        Ok((db, repository))
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

/// Validate a `--limit` value; absent means no limit
pub fn parse_limit(limit: Option<i64>) -> Result<Option<usize>> {
    match limit {
        None => Ok(None),
        Some(n) if n > 0 => Ok(Some(n as usize)),
        Some(n) => Err(IndexError::InvalidArgument {
            message: format!("--limit must be a positive integer, got {}", n),
        }),
    }
}

/// Pretty JSON with a trailing newline
pub fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(format!("{}\n", serde_json::to_string_pretty(value)?))
}

/// Shorten `s` to `max` characters, marking the cut with `...`
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_limit() {
        assert_eq!(parse_limit(None).unwrap(), None);
        assert_eq!(parse_limit(Some(5)).unwrap(), Some(5));
        assert!(matches!(parse_limit(Some(0)), Err(IndexError::InvalidArgument { .. })));
        assert!(matches!(parse_limit(Some(-2)), Err(IndexError::InvalidArgument { .. })));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("function veryLongName()", 12), "function ...");
    }
}

//! repo-index: heuristic code index for a repository
//!
//! Walks a file tree, recovers functions, imports, exports, dependencies and
//! complexity from JavaScript/TypeScript sources with line-oriented
//! heuristics, and stores everything in SQLite with full-text search over
//! files and functions. HTML, CSS, Markdown and config files get line counts
//! and a purpose string.
//!
//! # Example
//!
//! ```ignore
//! use repo_index::{ConfigOverrides, Database, IndexConfig, ScanOptions, Scanner};
//! use std::path::Path;
//!
//! let config = IndexConfig::load(Path::new("."), &ConfigOverrides::default())?;
//! let db = Database::open(&config.db_path)?;
//! let summary = Scanner::new(&db, &config).scan(ScanOptions::default())?;
//!
//! let hits = db.full_text_search(summary.repository.id, "riddle", Some(10))?;
//! for f in hits.functions {
//!     println!("{}:{} {}", f.file_path, f.start_line, f.name);
//! }
//! ```

pub mod analyzer;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod fs_utils;
pub mod git;
pub mod lang;
pub mod model;
pub mod report;
pub mod scanner;
pub mod storage;

// Re-export commonly used types
pub use analyzer::{analyze, FileAnalysis};
pub use cli::{Cli, Commands, OutputFormat};
pub use config::{ConfigOverrides, IndexConfig, RepoIdentity};
pub use error::{IndexError, Result};
pub use lang::{FileCategory, Lang};
pub use model::{
    ComponentCategory, DependencyKind, ExportData, ExportKind, FunctionData, ImportData,
    ImportKind, LineCounts, ScanKind, ScanStatus,
};
pub use scanner::{ScanOptions, ScanSummary, Scanner};
pub use storage::Database;

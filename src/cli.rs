//! CLI argument definitions using clap with subcommand architecture
//!
//! Limits and sort keys are taken as raw values and validated by the command
//! handlers, so a bad value is reported like every other error.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::{DATA_DIR_ENV, DB_ENV};
use crate::model::ScanKind;

/// Heuristic code index for a repository
#[derive(Parser, Debug)]
#[command(name = "repo-index")]
#[command(about = "Index a repository into SQLite and query functions, dependencies and complexity")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Repository root (defaults to the current directory)
    #[arg(long, value_name = "DIR", global = true)]
    pub root: Option<PathBuf>,

    /// Database file
    #[arg(long, value_name = "FILE", env = DB_ENV, global = true)]
    pub db: Option<PathBuf>,

    /// Directory for generated artifacts
    #[arg(long, value_name = "DIR", env = DATA_DIR_ENV, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Output format for query commands
    #[arg(short, long, default_value = "text", value_enum, global = true)]
    pub format: OutputFormat,

    /// Show verbose output and info-level logs
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ============================================
// Main Commands Enum
// ============================================

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Walk the repository and (re)build the index
    Scan(ScanArgs),

    /// Show repository, file and function totals
    Stats,

    /// List indexed files
    Files(FilesArgs),

    /// List indexed functions
    Functions(FunctionsArgs),

    /// Full-text search over files and functions
    #[command(visible_alias = "s")]
    Search(SearchArgs),

    /// List dependency edges
    Deps(LimitArgs),

    /// Rank files by complexity
    Complexity(LimitArgs),

    /// Print the whole index as one JSON document
    Export(ExportArgs),

    /// Copy the database into the backup directory
    Backup(BackupArgs),
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Directory to scan (overrides --root)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "full")]
    pub kind: ScanKindArg,

    /// Delete indexed files that no longer exist
    #[arg(long)]
    pub prune: bool,

    /// Skip writing the JSON and Markdown artifacts
    #[arg(long)]
    pub no_artifacts: bool,
}

#[derive(Args, Debug)]
pub struct FilesArgs {
    /// Maximum rows to show
    #[arg(short, long, allow_negative_numbers = true)]
    pub limit: Option<i64>,

    /// path, lines_count, size_bytes, name or file_type
    #[arg(long, default_value = "path")]
    pub sort: String,
}

#[derive(Args, Debug)]
pub struct FunctionsArgs {
    #[arg(short, long, allow_negative_numbers = true)]
    pub limit: Option<i64>,

    /// Only functions in files whose path contains this text
    #[arg(long, value_name = "SUBSTRING")]
    pub file: Option<String>,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Words to search for
    pub term: String,

    #[arg(short, long, allow_negative_numbers = true)]
    pub limit: Option<i64>,
}

#[derive(Args, Debug)]
pub struct LimitArgs {
    #[arg(short, long, allow_negative_numbers = true)]
    pub limit: Option<i64>,
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Write the document to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct BackupArgs {
    /// File name inside the backup directory (default: timestamped)
    #[arg(long, value_name = "FILE")]
    pub name: Option<PathBuf>,
}

// ============================================
// Value Enums
// ============================================

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable tables
    #[default]
    Text,
    /// JSON for machine parsing
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScanKindArg {
    #[default]
    Full,
    /// Skip files whose content fingerprint is unchanged
    Incremental,
}

impl From<ScanKindArg> for ScanKind {
    fn from(arg: ScanKindArg) -> Self {
        match arg {
            ScanKindArg::Full => ScanKind::Full,
            ScanKindArg::Incremental => ScanKind::Incremental,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_files_with_negative_limit() {
        let cli = Cli::try_parse_from(["repo-index", "files", "--limit", "-3", "--sort", "name"]).unwrap();
        match cli.command {
            Commands::Files(args) => {
                assert_eq!(args.limit, Some(-3));
                assert_eq!(args.sort, "name");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["repo-index", "stats", "--format", "json", "-v"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Stats));
    }

    #[test]
    fn test_scan_kind() {
        let cli = Cli::try_parse_from(["repo-index", "scan", "src", "--kind", "incremental", "--prune"])
            .unwrap();
        match cli.command {
            Commands::Scan(args) => {
                assert_eq!(ScanKind::from(args.kind), ScanKind::Incremental);
                assert!(args.prune);
                assert_eq!(args.path, Some(PathBuf::from("src")));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}

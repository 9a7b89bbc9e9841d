//! File enumeration with the fixed exclusion set

use std::path::{Path, PathBuf};

use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;

use crate::config::{IndexConfig, STATE_DIR_NAME};
use crate::error::{IndexError, Result};
use crate::fs_utils;

/// Paths never indexed, in gitignore glob syntax
pub const DEFAULT_EXCLUDES: &[&str] = &[
    ".git",
    "node_modules",
    "bower_components",
    "dist",
    "build",
    "out",
    "coverage",
    ".nyc_output",
    "backup",
    "backups",
    STATE_DIR_NAME,
    ".claude",
    "/.github/agents",
    "*.agent.md",
    "*.min.js",
    "*.min.css",
];

/// A file found by the walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile {
    pub abs_path: PathBuf,
    /// Repository-relative, `/`-separated
    pub rel_path: String,
}

/// Enumerate indexable files under `config.root`, sorted by path
pub fn walk_files(config: &IndexConfig) -> Result<Vec<WalkedFile>> {
    let root = &config.root;
    let overrides = build_overrides(config)?;

    let mut builder = WalkBuilder::new(root);

    // Respect .gitignore, even outside a git checkout
    builder.git_ignore(config.respect_gitignore);
    builder.git_global(config.respect_gitignore);
    builder.git_exclude(config.respect_gitignore);
    builder.parents(config.respect_gitignore);
    builder.require_git(false);

    builder.follow_links(false);

    // Dotfiles such as .gitignore and .editorconfig are indexed
    builder.hidden(false);

    builder.overrides(overrides);
    builder.sort_by_file_name(|a, b| a.cmp(b));

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let abs_path = entry.into_path();
        if let Some(rel_path) = fs_utils::relative_slash_path(root, &abs_path) {
            files.push(WalkedFile { abs_path, rel_path });
        }
    }

    tracing::debug!("walk found {} files under {}", files.len(), root.display());
    Ok(files)
}

fn build_overrides(config: &IndexConfig) -> Result<ignore::overrides::Override> {
    let root = &config.root;
    let mut builder = OverrideBuilder::new(root);
    let mut add = |glob: &str| {
        let negated = if glob.starts_with('!') {
            glob.to_string()
        } else {
            format!("!{}", glob)
        };
        builder
            .add(&negated)
            .map(|_| ())
            .map_err(|e| IndexError::Config {
                message: format!("Invalid exclude pattern '{}': {}", glob, e),
            })
    };

    for glob in DEFAULT_EXCLUDES {
        add(glob)?;
    }
    for glob in &config.exclude {
        add(glob)?;
    }

    // The store, its journals and generated output, wherever they were configured
    if let Some(db) = anchored(root, &config.db_path) {
        for suffix in ["", "-wal", "-shm", "-journal"] {
            add(&format!("{}{}", db, suffix))?;
        }
    }
    for dir in [&config.data_dir, &config.backup_dir] {
        if let Some(dir) = anchored(root, dir) {
            add(&dir)?;
        }
    }

    builder.build().map_err(|e| IndexError::Config {
        message: format!("Invalid exclude patterns: {}", e),
    })
}

/// `/`-anchored glob for a path inside `root`
fn anchored(root: &Path, path: &Path) -> Option<String> {
    let path = fs_utils::normalize_lexically(path);
    fs_utils::relative_slash_path(root, &path).map(|rel| format!("/{}", rel))
}

//! Repository scanner
//!
//! Walks the root, analyzes every file and writes the results through
//! [`Database`]. Each file's rows commit in their own transaction, so a scan
//! that fails part way leaves the files before the failure fully indexed and
//! nothing half-written. The scan row records the outcome.

pub mod resolve;
pub mod stats;
pub mod walk;

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};

use crate::analyzer::{self, FileAnalysis};
use crate::config::IndexConfig;
use crate::error::{IndexError, Result};
use crate::lang::{FileCategory, Lang};
use crate::model::{ComponentCategory, ScanKind};
use crate::storage::{Database, FileData, Repository, ScanTotals};

pub use stats::{LanguageShare, ScanStats};
pub use walk::{walk_files, WalkedFile};

/// How a scan should run
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    pub kind: ScanKind,
    /// Delete rows for files no longer present under the root
    pub prune: bool,
}

/// Outcome of a completed scan
#[derive(Debug, Clone)]
pub struct ScanSummary {
    pub scan_id: i64,
    pub repository: Repository,
    pub totals: ScanTotals,
    pub unchanged: usize,
    pub pruned: usize,
    pub languages: Vec<LanguageShare>,
    pub most_complex: Option<(String, u32)>,
    pub least_complex: Option<(String, u32)>,
}

/// What happened to one walked file
enum FileOutcome {
    Indexed { lines: usize, functions: usize, complexity: u32 },
    Unchanged { lines: usize },
}

pub struct Scanner<'a> {
    db: &'a Database,
    config: &'a IndexConfig,
}

impl<'a> Scanner<'a> {
    pub fn new(db: &'a Database, config: &'a IndexConfig) -> Self {
        Self { db, config }
    }

    /// Run one scan of the configured root.
    ///
    /// The scan row is opened before the walk starts. Per-file read and
    /// categorization failures are logged and counted without stopping the
    /// walk. Any other error stops the scan, marks the row failed, leaves the
    /// repository totals untouched and is returned.
    pub fn scan(&self, options: ScanOptions) -> Result<ScanSummary> {
        let identity = &self.config.identity;
        let repository = self
            .db
            .get_or_create_repository(&identity.owner, &identity.name, &identity.url)?;
        let scan_id = self.db.start_scan(repository.id, options.kind)?;
        tracing::info!(
            "scan {} ({}) of {}/{} started at {}",
            scan_id,
            options.kind.as_str(),
            repository.owner,
            repository.name,
            self.config.root.display()
        );

        let mut stats = ScanStats::default();
        match self.run(repository.id, options, &mut stats) {
            Ok(pruned) => {
                let totals = stats.totals();
                self.db.complete_scan(scan_id, &totals)?;
                tracing::info!(
                    "scan {} completed: {} files, {} lines, {} functions, {} errors",
                    scan_id,
                    totals.files_scanned,
                    totals.lines_scanned,
                    totals.functions_found,
                    totals.error_count
                );
                let repository = self.db.repository(repository.id)?.unwrap_or(repository);
                Ok(ScanSummary {
                    scan_id,
                    repository,
                    totals,
                    unchanged: stats.unchanged,
                    pruned,
                    languages: stats.language_shares(),
                    most_complex: stats.most_complex().map(|(p, c)| (p.to_string(), c)),
                    least_complex: stats.least_complex().map(|(p, c)| (p.to_string(), c)),
                })
            }
            Err(e) => {
                tracing::error!("scan {} failed: {}", scan_id, e);
                if let Err(seal) = self.db.fail_scan(scan_id, &stats.totals(), &e.to_string()) {
                    tracing::warn!("could not mark scan {} failed: {}", scan_id, seal);
                }
                Err(e)
            }
        }
    }

    /// Walk, index and aggregate. Returns the number of pruned files.
    fn run(&self, repo_id: i64, options: ScanOptions, stats: &mut ScanStats) -> Result<usize> {
        if let Some(version) = detect_version(self.config) {
            self.db.set_repository_version(repo_id, &version)?;
        }

        let walked = walk_files(self.config)?;
        let walked_paths: HashSet<String> = walked.iter().map(|f| f.rel_path.clone()).collect();
        // only analyzed files are import targets; the set grows as files commit
        let mut indexed: HashSet<String> = self.db.indexed_paths(repo_id)?.into_iter().collect();

        for file in &walked {
            let added = indexed.insert(file.rel_path.clone());
            match self.index_file(repo_id, file, options.kind, &indexed) {
                Ok((lang, FileOutcome::Indexed { lines, functions, complexity })) => {
                    stats.record_file(&file.rel_path, lang.name(), lines, functions, complexity);
                }
                Ok((lang, FileOutcome::Unchanged { lines })) => {
                    tracing::debug!("unchanged {}", file.rel_path);
                    stats.record_unchanged(lang.name(), lines);
                }
                Err(e) if e.is_analysis_error() => {
                    tracing::warn!("skipping {}: {}", file.rel_path, e);
                    stats.record_error();
                    if added {
                        indexed.remove(&file.rel_path);
                    }
                }
                Err(e) => return Err(e),
            }
        }

        let pruned = if options.prune {
            let pruned = self.db.transaction(|db| db.prune_files(repo_id, &walked_paths))?;
            tracing::info!("pruned {} stale files", pruned);
            pruned
        } else {
            0
        };

        let linked = self.link_pending_imports(repo_id)?;
        if linked > 0 {
            tracing::debug!("linked {} imports to files indexed later in the walk", linked);
        }

        let shares = stats.language_shares();
        self.db.transaction(|db| {
            for share in &shares {
                db.upsert_language(
                    repo_id,
                    &share.name,
                    share.file_count,
                    share.total_lines,
                    share.percentage,
                )?;
            }
            let names: Vec<&str> = shares.iter().map(|s| s.name.as_str()).collect();
            db.retain_languages(repo_id, &names)?;
            db.update_repository_totals(repo_id, stats.files_scanned, stats.lines_scanned)
        })?;

        Ok(pruned)
    }

    /// Resolve edges whose target was not indexed yet when they were written.
    /// Returns the number of edges that gained a target.
    fn link_pending_imports(&self, repo_id: i64) -> Result<usize> {
        self.db.transaction(|db| {
            let indexed: HashSet<String> = db.indexed_paths(repo_id)?.into_iter().collect();
            let mut linked = 0;
            for pending in db.unresolved_dependencies(repo_id)? {
                let Ok(lang) = Lang::from_path(Path::new(&pending.from_path)) else {
                    continue;
                };
                let Some(path) =
                    resolve::resolve_import(&indexed, &pending.from_path, lang, &pending.import_path)
                else {
                    continue;
                };
                if let Some(target) = db.file_id(repo_id, &path)? {
                    db.resolve_dependency(pending.id, target)?;
                    linked += 1;
                }
            }
            Ok(linked)
        })
    }

    /// Analyze and store one file. Imports resolve against `indexed`, which
    /// already contains this file's own path.
    fn index_file(
        &self,
        repo_id: i64,
        file: &WalkedFile,
        kind: ScanKind,
        indexed: &HashSet<String>,
    ) -> Result<(Lang, FileOutcome)> {
        let lang = Lang::from_path(&file.abs_path).map_err(|_| IndexError::Uncategorized {
            path: file.rel_path.clone(),
        })?;
        let bytes = fs::read(&file.abs_path).map_err(|e| IndexError::Unreadable {
            path: file.rel_path.clone(),
            message: e.to_string(),
        })?;
        let hash = format!("{:x}", Sha256::digest(&bytes));

        if kind == ScanKind::Incremental
            && self.db.file_hash(repo_id, &file.rel_path)?.as_deref() == Some(hash.as_str())
        {
            let lines = self.db.file_lines(repo_id, &file.rel_path)?.unwrap_or(0);
            return Ok((lang, FileOutcome::Unchanged { lines }));
        }

        let content = String::from_utf8(bytes).map_err(|_| IndexError::Unreadable {
            path: file.rel_path.clone(),
            message: "content is not valid UTF-8".to_string(),
        })?;
        let size_bytes = content.len() as u64;

        tracing::debug!("analyzing {} as {}", file.rel_path, lang.name());
        let analysis = analyzer::analyze(lang, &file.rel_path, &content);
        let data = file_data(file, lang, hash, size_bytes, &analysis);
        let components = classify_components(&file.rel_path, lang.category());

        self.db.transaction(|db| {
            let file_id = db.upsert_file(repo_id, &data)?;
            db.clear_file_children(file_id)?;

            for function in &analysis.functions {
                db.add_function(file_id, function)?;
            }
            for import in &analysis.imports {
                db.add_import(file_id, import)?;
                let target = match resolve::resolve_import(indexed, &file.rel_path, lang, &import.source) {
                    Some(path) if path == file.rel_path => Some(file_id),
                    Some(path) => db.file_id(repo_id, &path)?,
                    None => None,
                };
                db.add_dependency(file_id, target, import.dependency_kind, &import.source)?;
            }
            for export in &analysis.exports {
                db.add_export(file_id, export)?;
            }
            for component in &components {
                db.tag_file_component(file_id, *component)?;
            }
            Ok(())
        })?;

        Ok((
            lang,
            FileOutcome::Indexed {
                lines: analysis.lines.total,
                functions: analysis.functions.len(),
                complexity: analysis.complexity,
            },
        ))
    }
}

fn file_data(file: &WalkedFile, lang: Lang, hash: String, size_bytes: u64, analysis: &FileAnalysis) -> FileData {
    let name = file
        .rel_path
        .rsplit('/')
        .next()
        .unwrap_or(&file.rel_path)
        .to_string();
    let extension = file
        .abs_path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let last_modified = fs::metadata(&file.abs_path)
        .and_then(|m| m.modified())
        .ok()
        .map(|t| DateTime::<Utc>::from(t).to_rfc3339_opts(SecondsFormat::Secs, true));

    FileData {
        path: file.rel_path.clone(),
        name,
        extension,
        file_type: lang.name().to_string(),
        size_bytes,
        lines: analysis.lines,
        hash,
        purpose: analysis.purpose.clone(),
        complexity_score: analysis.complexity,
        last_modified,
    }
}

/// Tag a file with one or more components from its path and category
pub fn classify_components(path: &str, category: FileCategory) -> Vec<ComponentCategory> {
    let lower = path.to_lowercase();
    let segments: Vec<&str> = lower.split('/').collect();
    let file_name = segments.last().copied().unwrap_or("");
    let dirs = &segments[..segments.len().saturating_sub(1)];
    let in_dir = |names: &[&str]| dirs.iter().any(|d| names.contains(d));
    let words: Vec<&str> = file_name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let mut tags = Vec::new();

    if in_dir(&["test", "tests", "__tests__", "spec", "specs"])
        || file_name.contains(".test.")
        || file_name.contains(".spec.")
    {
        tags.push(ComponentCategory::Test);
    }

    if in_dir(&[".github", "scripts", "tools", "ci", "deploy", ".husky"])
        || file_name.starts_with("sw.")
        || file_name.starts_with("service-worker")
        || ["webpack.", "vite.", "rollup.", "gulpfile", "gruntfile", "makefile"]
            .iter()
            .any(|p| file_name.starts_with(p))
    {
        tags.push(ComponentCategory::Infrastructure);
    }

    let by_category = match category {
        FileCategory::Doc => ComponentCategory::Documentation,
        FileCategory::Markup | FileCategory::Stylesheet => ComponentCategory::Ui,
        FileCategory::Config if in_dir(&["data", "fixtures"]) => ComponentCategory::Data,
        FileCategory::Config => ComponentCategory::Config,
        FileCategory::Script => {
            if in_dir(&["ui", "components", "views", "pages", "widgets"])
                || words
                    .iter()
                    .any(|w| ["ui", "view", "views", "render", "dom"].contains(w))
            {
                ComponentCategory::Ui
            } else if in_dir(&["data", "db", "database", "storage", "models", "store"]) {
                ComponentCategory::Data
            } else {
                ComponentCategory::Logic
            }
        }
    };
    if !tags.contains(&by_category) {
        tags.push(by_category);
    }
    tags
}

/// `version` from a `package.json` at the root, if any
fn detect_version(config: &IndexConfig) -> Option<String> {
    let content = fs::read_to_string(config.root.join("package.json")).ok()?;
    let manifest: serde_json::Value = serde_json::from_str(&content).ok()?;
    manifest
        .get("version")
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

//! Generated documentation artifacts
//!
//! A read-then-serialize pass over the store: [`Snapshot::collect`] reads
//! everything once, then each document is rendered from the snapshot and
//! written atomically into the data directory. Nothing here writes to the
//! store.

pub mod documents;
pub mod markdown;

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::fs_utils;
use crate::storage::{
    now_timestamp, ComplexityEntry, Database, DependencyEdge, ExportRow, FileRow, FileSort,
    FunctionRow, Repository, RepositoryMetrics,
};

pub const STRUCTURE_FILE: &str = "structure.json";
pub const CODE_INDEX_FILE: &str = "code-index.json";
pub const METRICS_FILE: &str = "metrics.json";
pub const ARCHITECTURE_FILE: &str = "ARCHITECTURE.md";

/// Number of entries in each insight list and the architecture top list
pub const TOP_N: usize = 10;

/// Files above this complexity score count as technical debt
pub const HIGH_COMPLEXITY: i64 = 20;
/// Files above this complexity score need attention first
pub const VERY_HIGH_COMPLEXITY: i64 = 50;

/// Everything the artifacts are rendered from, read in one pass
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub generated_at: String,
    pub repository: Repository,
    pub files: Vec<FileRow>,
    pub functions: Vec<FunctionRow>,
    pub exports: Vec<ExportRow>,
    pub dependencies: Vec<DependencyEdge>,
    pub components: Vec<(String, String)>,
    pub metrics: RepositoryMetrics,
    pub most_complex: Vec<ComplexityEntry>,
}

impl Snapshot {
    pub fn collect(db: &Database, repository: &Repository) -> Result<Self> {
        let repo_id = repository.id;
        let repository = db.repository(repo_id)?.unwrap_or_else(|| repository.clone());
        Ok(Self {
            generated_at: now_timestamp(),
            files: db.list_files(repo_id, FileSort::Path, None)?,
            functions: db.list_functions(repo_id, None, None)?,
            exports: db.list_exports(repo_id)?,
            dependencies: db.dependency_graph(repo_id)?,
            components: db.file_components(repo_id)?,
            metrics: db.repository_metrics(repo_id)?,
            most_complex: db.complexity_report(repo_id, Some(TOP_N))?,
            repository,
        })
    }

    /// Files with more resolved edges (in plus out) first
    pub fn most_connected(&self, limit: usize) -> Vec<(String, usize)> {
        let mut degree: std::collections::BTreeMap<&str, usize> = std::collections::BTreeMap::new();
        for edge in &self.dependencies {
            if let Some(to) = &edge.to_path {
                *degree.entry(edge.from_path.as_str()).or_default() += 1;
                *degree.entry(to.as_str()).or_default() += 1;
            }
        }
        let mut ranked: Vec<(String, usize)> =
            degree.into_iter().map(|(p, d)| (p.to_string(), d)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(limit);
        ranked
    }

    /// Largest files by line count
    pub fn largest(&self, limit: usize) -> Vec<&FileRow> {
        let mut files: Vec<&FileRow> = self.files.iter().collect();
        files.sort_by(|a, b| b.lines_count.cmp(&a.lines_count).then_with(|| a.path.cmp(&b.path)));
        files.truncate(limit);
        files
    }

    /// Files above the high and very-high complexity thresholds
    pub fn debt_counts(&self) -> (usize, usize) {
        let high = self
            .files
            .iter()
            .filter(|f| f.complexity_score > HIGH_COMPLEXITY)
            .count();
        let very_high = self
            .files
            .iter()
            .filter(|f| f.complexity_score > VERY_HIGH_COMPLEXITY)
            .count();
        (high, very_high)
    }
}

/// Render and write the four artifacts into `data_dir`. Returns the paths
/// written, in a fixed order.
pub fn write_artifacts(db: &Database, repository: &Repository, data_dir: &Path) -> Result<Vec<PathBuf>> {
    let snapshot = Snapshot::collect(db, repository)?;

    let outputs = [
        (
            STRUCTURE_FILE,
            serde_json::to_string_pretty(&documents::structure(&snapshot))?,
        ),
        (
            CODE_INDEX_FILE,
            serde_json::to_string_pretty(&documents::code_index(&snapshot))?,
        ),
        (
            METRICS_FILE,
            serde_json::to_string_pretty(&documents::metrics(&snapshot))?,
        ),
        (ARCHITECTURE_FILE, markdown::architecture(&snapshot)),
    ];

    let mut written = Vec::with_capacity(outputs.len());
    for (name, content) in outputs {
        let path = data_dir.join(name);
        fs_utils::write_atomic(&path, content.as_bytes())?;
        tracing::debug!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

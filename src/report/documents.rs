//! JSON artifact shapes

use std::collections::BTreeMap;

use serde::Serialize;

use super::{Snapshot, HIGH_COMPLEXITY, TOP_N, VERY_HIGH_COMPLEXITY};
use crate::storage::{
    ComplexityEntry, ComponentStat, DependencyEdge, DependencyMetrics, FileMetrics,
    FunctionMetrics, LanguageStat,
};

// ============================================================================
// structure.json
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StructureDoc {
    pub metadata: Metadata,
    pub files: BTreeMap<String, FileEntry>,
    pub dependencies: Vec<DependencyEdge>,
    /// Target path -> files importing it
    pub used_by: BTreeMap<String, Vec<String>>,
    /// Component name -> tagged files
    pub components: BTreeMap<String, Vec<String>>,
    pub insights: Insights,
}

#[derive(Debug, Serialize)]
pub struct Metadata {
    pub generated_at: String,
    pub repository: String,
    pub version: Option<String>,
    pub total_files: i64,
    pub total_lines: i64,
    pub last_scan_at: Option<String>,
    pub languages: Vec<LanguageStat>,
}

#[derive(Debug, Serialize)]
pub struct FileEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub file_type: String,
    pub size_bytes: i64,
    pub lines: i64,
    pub code_lines: i64,
    pub comment_lines: i64,
    pub blank_lines: i64,
    pub purpose: String,
    pub complexity: i64,
    pub functions: i64,
    pub imports: i64,
    pub exports: i64,
}

#[derive(Debug, Serialize)]
pub struct Insights {
    pub most_complex: Vec<RankedFile>,
    pub most_connected: Vec<RankedFile>,
    pub largest: Vec<RankedFile>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct RankedFile {
    pub path: String,
    pub value: i64,
}

pub fn structure(snapshot: &Snapshot) -> StructureDoc {
    let repo = &snapshot.repository;

    let files = snapshot
        .files
        .iter()
        .map(|f| {
            (
                f.path.clone(),
                FileEntry {
                    name: f.name.clone(),
                    file_type: f.file_type.clone(),
                    size_bytes: f.size_bytes,
                    lines: f.lines_count,
                    code_lines: f.code_lines,
                    comment_lines: f.comment_lines,
                    blank_lines: f.blank_lines,
                    purpose: f.purpose.clone(),
                    complexity: f.complexity_score,
                    functions: f.function_count,
                    imports: f.import_count,
                    exports: f.export_count,
                },
            )
        })
        .collect();

    let mut used_by: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for edge in &snapshot.dependencies {
        if let Some(to) = &edge.to_path {
            let importers = used_by.entry(to.clone()).or_default();
            if !importers.contains(&edge.from_path) {
                importers.push(edge.from_path.clone());
            }
        }
    }

    let mut components: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (path, component) in &snapshot.components {
        components.entry(component.clone()).or_default().push(path.clone());
    }

    let insights = Insights {
        most_complex: snapshot
            .most_complex
            .iter()
            .filter(|e| e.complexity_score > 0)
            .map(|e| RankedFile {
                path: e.path.clone(),
                value: e.complexity_score,
            })
            .collect(),
        most_connected: snapshot
            .most_connected(TOP_N)
            .into_iter()
            .map(|(path, degree)| RankedFile {
                path,
                value: degree as i64,
            })
            .collect(),
        largest: snapshot
            .largest(TOP_N)
            .into_iter()
            .map(|f| RankedFile {
                path: f.path.clone(),
                value: f.lines_count,
            })
            .collect(),
    };

    StructureDoc {
        metadata: Metadata {
            generated_at: snapshot.generated_at.clone(),
            repository: format!("{}/{}", repo.owner, repo.name),
            version: repo.version.clone(),
            total_files: snapshot.metrics.files.total_files,
            total_lines: snapshot.metrics.files.total_lines,
            last_scan_at: repo.last_scan_at.clone(),
            languages: snapshot.metrics.languages.clone(),
        },
        files,
        dependencies: snapshot.dependencies.clone(),
        used_by,
        components,
        insights,
    }
}

// ============================================================================
// code-index.json
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CodeIndexDoc {
    pub generated_at: String,
    /// Function name -> every definition with that name
    pub functions: BTreeMap<String, Vec<FunctionEntry>>,
    pub exports: BTreeMap<String, Vec<ExportEntry>>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct FunctionEntry {
    pub file: String,
    pub line: i64,
    pub signature: String,
    pub purpose: String,
    #[serde(rename = "async")]
    pub is_async: bool,
    pub exported: bool,
    pub complexity: i64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ExportEntry {
    pub file: String,
    pub line: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

pub fn code_index(snapshot: &Snapshot) -> CodeIndexDoc {
    let mut functions: BTreeMap<String, Vec<FunctionEntry>> = BTreeMap::new();
    for f in &snapshot.functions {
        functions.entry(f.name.clone()).or_default().push(FunctionEntry {
            file: f.file_path.clone(),
            line: f.start_line,
            signature: f.signature.clone(),
            purpose: f.purpose.clone(),
            is_async: f.is_async,
            exported: f.is_exported,
            complexity: f.complexity,
        });
    }

    let mut exports: BTreeMap<String, Vec<ExportEntry>> = BTreeMap::new();
    for e in &snapshot.exports {
        exports.entry(e.name.clone()).or_default().push(ExportEntry {
            file: e.file_path.clone(),
            line: e.line,
            kind: e.kind.clone(),
        });
    }

    CodeIndexDoc {
        generated_at: snapshot.generated_at.clone(),
        functions,
        exports,
    }
}

// ============================================================================
// metrics.json
// ============================================================================

#[derive(Debug, Serialize)]
pub struct MetricsDoc {
    pub generated_at: String,
    pub files: FileMetrics,
    pub functions: FunctionMetrics,
    pub languages: Vec<LanguageStat>,
    pub components: Vec<ComponentStat>,
    pub dependencies: DependencyMetrics,
    pub complexity: ComplexityMetrics,
}

#[derive(Debug, Serialize)]
pub struct ComplexityMetrics {
    pub top_files: Vec<ComplexityEntry>,
    pub distribution: ComplexityDistribution,
}

/// File counts per complexity band
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct ComplexityDistribution {
    /// 0..=10
    pub low: usize,
    /// 11..=HIGH
    pub medium: usize,
    /// above HIGH up to VERY_HIGH
    pub high: usize,
    /// above VERY_HIGH
    pub very_high: usize,
}

pub fn metrics(snapshot: &Snapshot) -> MetricsDoc {
    let mut distribution = ComplexityDistribution::default();
    for file in &snapshot.files {
        match file.complexity_score {
            s if s > VERY_HIGH_COMPLEXITY => distribution.very_high += 1,
            s if s > HIGH_COMPLEXITY => distribution.high += 1,
            s if s > 10 => distribution.medium += 1,
            _ => distribution.low += 1,
        }
    }

    MetricsDoc {
        generated_at: snapshot.generated_at.clone(),
        files: snapshot.metrics.files.clone(),
        functions: snapshot.metrics.functions.clone(),
        languages: snapshot.metrics.languages.clone(),
        components: snapshot.metrics.components.clone(),
        dependencies: snapshot.metrics.dependencies.clone(),
        complexity: ComplexityMetrics {
            top_files: snapshot.most_complex.clone(),
            distribution,
        },
    }
}

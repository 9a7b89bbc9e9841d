//! Row types read from and written to the store

use serde::Serialize;

use crate::model::LineCounts;

/// Repository root record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Repository {
    pub id: i64,
    pub owner: String,
    pub name: String,
    pub url: String,
    pub version: Option<String>,
    pub total_files: i64,
    pub total_lines: i64,
    pub last_scan_at: Option<String>,
}

/// Input for `Database::upsert_file`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileData {
    /// Repository-relative path with `/` separators
    pub path: String,
    pub name: String,
    pub extension: String,
    pub file_type: String,
    pub size_bytes: u64,
    pub lines: LineCounts,
    /// Hex SHA-256 of the full content
    pub hash: String,
    pub purpose: String,
    pub complexity_score: u32,
    pub last_modified: Option<String>,
}

/// One row of the `scans` audit trail
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanRecord {
    pub id: i64,
    pub repository_id: i64,
    pub kind: String,
    pub status: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub files_scanned: i64,
    pub lines_scanned: i64,
    pub functions_found: i64,
    pub error_count: i64,
    pub error_message: Option<String>,
}

/// Final counts sealed onto a completed scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanTotals {
    pub files_scanned: usize,
    pub lines_scanned: usize,
    pub functions_found: usize,
    pub error_count: usize,
}

/// File row as listed by `files` and exported in artifacts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileRow {
    pub id: i64,
    pub path: String,
    pub name: String,
    pub extension: String,
    pub file_type: String,
    pub size_bytes: i64,
    pub lines_count: i64,
    pub code_lines: i64,
    pub comment_lines: i64,
    pub blank_lines: i64,
    pub hash: Option<String>,
    pub purpose: String,
    pub complexity_score: i64,
    pub function_count: i64,
    pub import_count: i64,
    pub export_count: i64,
}

/// Function row joined with its file path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionRow {
    pub id: i64,
    pub file_path: String,
    pub name: String,
    pub signature: String,
    pub start_line: i64,
    pub end_line: i64,
    pub is_async: bool,
    pub is_exported: bool,
    pub is_arrow: bool,
    pub complexity: i64,
    pub purpose: String,
}

/// Import row joined with its file path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportRow {
    pub file_path: String,
    pub source: String,
    pub items: Vec<String>,
    pub kind: String,
    pub line: i64,
    pub is_external: bool,
}

/// Export row joined with its file path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub file_path: String,
    pub name: String,
    pub kind: String,
    pub line: i64,
    pub local_name: Option<String>,
}

/// File match from full-text search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileHit {
    pub id: i64,
    pub path: String,
    pub name: String,
    pub purpose: String,
    pub rank: f64,
}

/// Function match from full-text search
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionHit {
    pub id: i64,
    pub file_path: String,
    pub name: String,
    pub signature: String,
    pub start_line: i64,
    pub purpose: String,
    pub rank: f64,
}

/// Independently ranked search results
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults {
    pub files: Vec<FileHit>,
    pub functions: Vec<FunctionHit>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.functions.is_empty()
    }
}

/// Dependency graph edge; `to_path` is `None` when unresolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyEdge {
    pub from_path: String,
    pub to_path: Option<String>,
    pub kind: String,
    pub import_path: String,
    pub is_resolved: bool,
}

/// Edge still waiting for a target file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedDependency {
    pub id: i64,
    pub from_path: String,
    pub import_path: String,
}

/// One line of the complexity report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexityEntry {
    pub path: String,
    pub complexity_score: i64,
    pub lines_count: i64,
    pub function_count: i64,
    pub avg_function_complexity: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FileMetrics {
    pub total_files: i64,
    pub total_lines: i64,
    pub code_lines: i64,
    pub comment_lines: i64,
    pub blank_lines: i64,
    pub total_size_bytes: i64,
    pub avg_complexity: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FunctionMetrics {
    pub total_functions: i64,
    pub exported_functions: i64,
    pub async_functions: i64,
    pub arrow_functions: i64,
    pub avg_complexity: f64,
    pub max_complexity: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageStat {
    pub name: String,
    pub file_count: i64,
    pub total_lines: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentStat {
    pub name: String,
    pub description: String,
    pub file_count: i64,
    pub total_lines: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyMetrics {
    pub total: i64,
    pub resolved: i64,
    pub unresolved: i64,
    pub external_imports: i64,
}

/// Repository-wide rollup
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RepositoryMetrics {
    pub files: FileMetrics,
    pub functions: FunctionMetrics,
    pub dependencies: DependencyMetrics,
    pub languages: Vec<LanguageStat>,
    pub components: Vec<ComponentStat>,
}

/// Sort keys accepted by `Database::list_files`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileSort {
    #[default]
    Path,
    LinesCount,
    SizeBytes,
    Name,
    FileType,
}

impl FileSort {
    pub const NAMES: [&'static str; 5] = ["path", "lines_count", "size_bytes", "name", "file_type"];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "path" => Some(Self::Path),
            "lines_count" => Some(Self::LinesCount),
            "size_bytes" => Some(Self::SizeBytes),
            "name" => Some(Self::Name),
            "file_type" => Some(Self::FileType),
            _ => None,
        }
    }

    /// ORDER BY clause; only ever built from this closed set
    pub(crate) fn order_by(&self) -> &'static str {
        match self {
            Self::Path => "path ASC",
            Self::LinesCount => "lines_count DESC, path ASC",
            Self::SizeBytes => "size_bytes DESC, path ASC",
            Self::Name => "name ASC, path ASC",
            Self::FileType => "file_type ASC, path ASC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_sort_parse() {
        for name in FileSort::NAMES {
            assert!(FileSort::parse(name).is_some(), "{} should parse", name);
        }
        assert_eq!(FileSort::parse("lines_count"), Some(FileSort::LinesCount));
        assert_eq!(FileSort::parse("DROP TABLE files"), None);
    }
}

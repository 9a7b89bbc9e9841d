//! Read-only queries: search, dependency graph, complexity and rollups
//!
//! Everything here only reads committed state, so it is safe to call while
//! a scan is writing or after one failed.

use rusqlite::{params, OptionalExtension, Row};

use super::{
    sql_limit, ComplexityEntry, ComponentStat, Database, DependencyEdge, DependencyMetrics,
    ExportRow, FileHit, FileMetrics, FileRow, FileSort, FunctionHit, FunctionMetrics,
    FunctionRow, ImportRow, LanguageStat, Repository, RepositoryMetrics, ScanRecord,
    SearchResults,
};
use crate::error::{Result, StorageContext};

const REPOSITORY_COLUMNS: &str =
    "id, owner, name, url, version, total_files, total_lines, last_scan_at";

fn repository_from_row(row: &Row<'_>) -> rusqlite::Result<Repository> {
    Ok(Repository {
        id: row.get(0)?,
        owner: row.get(1)?,
        name: row.get(2)?,
        url: row.get(3)?,
        version: row.get(4)?,
        total_files: row.get(5)?,
        total_lines: row.get(6)?,
        last_scan_at: row.get(7)?,
    })
}

/// Turn free text into an FTS5 query: every whitespace-separated token is
/// quoted so punctuation and keywords (`AND`, `NEAR`) match literally, and the
/// tokens are ANDed together.
pub fn fts_query(term: &str) -> Option<String> {
    let tokens: Vec<String> = term
        .split_whitespace()
        .map(|t| format!("\"{}\"", t.replace('"', "\"\"")))
        .collect();
    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" "))
    }
}

impl Database {
    pub fn find_repository(&self, owner: &str, name: &str) -> Result<Option<Repository>> {
        const OP: &str = "find repository";
        self.conn(OP)?
            .query_row(
                &format!(
                    "SELECT {} FROM repositories WHERE owner = ?1 AND name = ?2",
                    REPOSITORY_COLUMNS
                ),
                params![owner, name],
                repository_from_row,
            )
            .optional()
            .storage(OP)
    }

    pub fn repository(&self, repo_id: i64) -> Result<Option<Repository>> {
        const OP: &str = "get repository";
        self.conn(OP)?
            .query_row(
                &format!("SELECT {} FROM repositories WHERE id = ?1", REPOSITORY_COLUMNS),
                [repo_id],
                repository_from_row,
            )
            .optional()
            .storage(OP)
    }

    /// Scan history, newest first
    pub fn scans(&self, repo_id: i64) -> Result<Vec<ScanRecord>> {
        const OP: &str = "list scans";
        let conn = self.conn(OP)?;
        let mut stmt = conn
            .prepare(
                "SELECT id, repository_id, kind, status, started_at, finished_at,
                        files_scanned, lines_scanned, functions_found, error_count, error_message
                 FROM scans WHERE repository_id = ?1 ORDER BY id DESC",
            )
            .storage(OP)?;
        let rows = stmt
            .query_map([repo_id], |row| {
                Ok(ScanRecord {
                    id: row.get(0)?,
                    repository_id: row.get(1)?,
                    kind: row.get(2)?,
                    status: row.get(3)?,
                    started_at: row.get(4)?,
                    finished_at: row.get(5)?,
                    files_scanned: row.get(6)?,
                    lines_scanned: row.get(7)?,
                    functions_found: row.get(8)?,
                    error_count: row.get(9)?,
                    error_message: row.get(10)?,
                })
            })
            .storage(OP)?;
        rows.collect::<std::result::Result<Vec<_>, _>>().storage(OP)
    }

    /// Match `term` against file name/path/purpose and function
    /// name/signature/purpose. The two lists are ranked independently by FTS5
    /// relevance.
    pub fn full_text_search(&self, repo_id: i64, term: &str, limit: Option<usize>) -> Result<SearchResults> {
        const OP: &str = "full-text search";
        let Some(query) = fts_query(term) else {
            return Ok(SearchResults::default());
        };
        let conn = self.conn(OP)?;
        let limit = sql_limit(limit);

        let files = {
            let mut stmt = conn
                .prepare_cached(
                    "SELECT f.id, f.path, f.name, f.purpose, files_fts.rank
                     FROM files_fts
                     JOIN files f ON f.id = files_fts.rowid
                     WHERE files_fts MATCH ?1 AND f.repository_id = ?2
                     ORDER BY files_fts.rank, f.path
                     LIMIT ?3",
                )
                .storage(OP)?;
            let rows = stmt
                .query_map(params![query, repo_id, limit], |row| {
                    Ok(FileHit {
                        id: row.get(0)?,
                        path: row.get(1)?,
                        name: row.get(2)?,
                        purpose: row.get(3)?,
                        rank: row.get(4)?,
                    })
                })
                .storage(OP)?;
            rows.collect::<std::result::Result<Vec<_>, _>>().storage(OP)?
        };

        let functions = {
            let mut stmt = conn
                .prepare_cached(
                    "SELECT fn.id, f.path, fn.name, fn.signature, fn.start_line, fn.purpose,
                            functions_fts.rank
                     FROM functions_fts
                     JOIN functions fn ON fn.id = functions_fts.rowid
                     JOIN files f ON f.id = fn.file_id
                     WHERE functions_fts MATCH ?1 AND f.repository_id = ?2
                     ORDER BY functions_fts.rank, f.path, fn.start_line
                     LIMIT ?3",
                )
                .storage(OP)?;
            let rows = stmt
                .query_map(params![query, repo_id, limit], |row| {
                    Ok(FunctionHit {
                        id: row.get(0)?,
                        file_path: row.get(1)?,
                        name: row.get(2)?,
                        signature: row.get(3)?,
                        start_line: row.get(4)?,
                        purpose: row.get(5)?,
                        rank: row.get(6)?,
                    })
                })
                .storage(OP)?;
            rows.collect::<std::result::Result<Vec<_>, _>>().storage(OP)?
        };

        Ok(SearchResults { files, functions })
    }

    /// All edges as (from, to-or-none, kind), ordered by source path
    pub fn dependency_graph(&self, repo_id: i64) -> Result<Vec<DependencyEdge>> {
        const OP: &str = "dependency graph";
        let conn = self.conn(OP)?;
        let mut stmt = conn
            .prepare(
                "SELECT from_path, to_path, kind, import_path, is_resolved
                 FROM v_dependency_graph
                 WHERE repository_id = ?1
                 ORDER BY from_path, id",
            )
            .storage(OP)?;
        let rows = stmt
            .query_map([repo_id], |row| {
                Ok(DependencyEdge {
                    from_path: row.get(0)?,
                    to_path: row.get(1)?,
                    kind: row.get(2)?,
                    import_path: row.get(3)?,
                    is_resolved: row.get(4)?,
                })
            })
            .storage(OP)?;
        rows.collect::<std::result::Result<Vec<_>, _>>().storage(OP)
    }

    /// Top-`limit` files by complexity score with function statistics
    pub fn complexity_report(&self, repo_id: i64, limit: Option<usize>) -> Result<Vec<ComplexityEntry>> {
        const OP: &str = "complexity report";
        let conn = self.conn(OP)?;
        let mut stmt = conn
            .prepare(
                "SELECT f.path, f.complexity_score, f.lines_count,
                        COUNT(fn.id), COALESCE(AVG(fn.complexity), 0.0)
                 FROM files f
                 LEFT JOIN functions fn ON fn.file_id = f.id
                 WHERE f.repository_id = ?1
                 GROUP BY f.id
                 ORDER BY f.complexity_score DESC, f.path ASC
                 LIMIT ?2",
            )
            .storage(OP)?;
        let rows = stmt
            .query_map(params![repo_id, sql_limit(limit)], |row| {
                Ok(ComplexityEntry {
                    path: row.get(0)?,
                    complexity_score: row.get(1)?,
                    lines_count: row.get(2)?,
                    function_count: row.get(3)?,
                    avg_function_complexity: row.get(4)?,
                })
            })
            .storage(OP)?;
        rows.collect::<std::result::Result<Vec<_>, _>>().storage(OP)
    }

    /// File, function, dependency, language and component rollups
    pub fn repository_metrics(&self, repo_id: i64) -> Result<RepositoryMetrics> {
        const OP: &str = "repository metrics";
        let conn = self.conn(OP)?;

        let files = conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(lines_count), 0), COALESCE(SUM(code_lines), 0),
                        COALESCE(SUM(comment_lines), 0), COALESCE(SUM(blank_lines), 0),
                        COALESCE(SUM(size_bytes), 0), COALESCE(AVG(complexity_score), 0.0)
                 FROM files WHERE repository_id = ?1",
                [repo_id],
                |row| {
                    Ok(FileMetrics {
                        total_files: row.get(0)?,
                        total_lines: row.get(1)?,
                        code_lines: row.get(2)?,
                        comment_lines: row.get(3)?,
                        blank_lines: row.get(4)?,
                        total_size_bytes: row.get(5)?,
                        avg_complexity: row.get(6)?,
                    })
                },
            )
            .storage(OP)?;

        let functions = conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(is_exported), 0), COALESCE(SUM(is_async), 0),
                        COALESCE(SUM(is_arrow), 0), COALESCE(AVG(complexity), 0.0),
                        COALESCE(MAX(complexity), 0)
                 FROM v_function_summary WHERE repository_id = ?1",
                [repo_id],
                |row| {
                    Ok(FunctionMetrics {
                        total_functions: row.get(0)?,
                        exported_functions: row.get(1)?,
                        async_functions: row.get(2)?,
                        arrow_functions: row.get(3)?,
                        avg_complexity: row.get(4)?,
                        max_complexity: row.get(5)?,
                    })
                },
            )
            .storage(OP)?;

        let dependencies = conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(is_resolved), 0),
                        (SELECT COUNT(*) FROM imports i JOIN files f ON f.id = i.file_id
                         WHERE f.repository_id = ?1 AND i.is_external = 1)
                 FROM v_dependency_graph WHERE repository_id = ?1",
                [repo_id],
                |row| {
                    let total: i64 = row.get(0)?;
                    let resolved: i64 = row.get(1)?;
                    Ok(DependencyMetrics {
                        total,
                        resolved,
                        unresolved: total - resolved,
                        external_imports: row.get(2)?,
                    })
                },
            )
            .storage(OP)?;

        let languages = {
            let mut stmt = conn
                .prepare(
                    "SELECT name, file_count, total_lines, percentage
                     FROM v_language_summary WHERE repository_id = ?1
                     ORDER BY total_lines DESC, name ASC",
                )
                .storage(OP)?;
            let rows = stmt
                .query_map([repo_id], |row| {
                    Ok(LanguageStat {
                        name: row.get(0)?,
                        file_count: row.get(1)?,
                        total_lines: row.get(2)?,
                        percentage: row.get(3)?,
                    })
                })
                .storage(OP)?;
            rows.collect::<std::result::Result<Vec<_>, _>>().storage(OP)?
        };

        let components = {
            let mut stmt = conn
                .prepare(
                    "SELECT name, description, file_count, total_lines
                     FROM v_component_summary WHERE repository_id = ?1
                     ORDER BY file_count DESC, name ASC",
                )
                .storage(OP)?;
            let rows = stmt
                .query_map([repo_id], |row| {
                    Ok(ComponentStat {
                        name: row.get(0)?,
                        description: row.get(1)?,
                        file_count: row.get(2)?,
                        total_lines: row.get(3)?,
                    })
                })
                .storage(OP)?;
            rows.collect::<std::result::Result<Vec<_>, _>>().storage(OP)?
        };

        Ok(RepositoryMetrics {
            files,
            functions,
            dependencies,
            languages,
            components,
        })
    }

    pub fn list_files(&self, repo_id: i64, sort: FileSort, limit: Option<usize>) -> Result<Vec<FileRow>> {
        const OP: &str = "list files";
        let conn = self.conn(OP)?;
        let sql = format!(
            "SELECT id, path, name, extension, file_type, size_bytes, lines_count, code_lines,
                    comment_lines, blank_lines, hash, purpose, complexity_score,
                    function_count, import_count, export_count
             FROM v_file_details
             WHERE repository_id = ?1
             ORDER BY {}
             LIMIT ?2",
            sort.order_by()
        );
        let mut stmt = conn.prepare(&sql).storage(OP)?;
        let rows = stmt
            .query_map(params![repo_id, sql_limit(limit)], |row| {
                Ok(FileRow {
                    id: row.get(0)?,
                    path: row.get(1)?,
                    name: row.get(2)?,
                    extension: row.get(3)?,
                    file_type: row.get(4)?,
                    size_bytes: row.get(5)?,
                    lines_count: row.get(6)?,
                    code_lines: row.get(7)?,
                    comment_lines: row.get(8)?,
                    blank_lines: row.get(9)?,
                    hash: row.get(10)?,
                    purpose: row.get(11)?,
                    complexity_score: row.get(12)?,
                    function_count: row.get(13)?,
                    import_count: row.get(14)?,
                    export_count: row.get(15)?,
                })
            })
            .storage(OP)?;
        rows.collect::<std::result::Result<Vec<_>, _>>().storage(OP)
    }

    /// Functions ordered by file then position, optionally restricted to
    /// files whose path contains `file_filter`
    pub fn list_functions(
        &self,
        repo_id: i64,
        file_filter: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<FunctionRow>> {
        const OP: &str = "list functions";
        let conn = self.conn(OP)?;
        let mut stmt = conn
            .prepare(
                "SELECT id, file_path, name, signature, start_line, end_line,
                        is_async, is_exported, is_arrow, complexity, purpose
                 FROM v_function_summary
                 WHERE repository_id = ?1 AND (?2 IS NULL OR instr(file_path, ?2) > 0)
                 ORDER BY file_path, start_line, id
                 LIMIT ?3",
            )
            .storage(OP)?;
        let rows = stmt
            .query_map(params![repo_id, file_filter, sql_limit(limit)], |row| {
                Ok(FunctionRow {
                    id: row.get(0)?,
                    file_path: row.get(1)?,
                    name: row.get(2)?,
                    signature: row.get(3)?,
                    start_line: row.get(4)?,
                    end_line: row.get(5)?,
                    is_async: row.get(6)?,
                    is_exported: row.get(7)?,
                    is_arrow: row.get(8)?,
                    complexity: row.get(9)?,
                    purpose: row.get(10)?,
                })
            })
            .storage(OP)?;
        rows.collect::<std::result::Result<Vec<_>, _>>().storage(OP)
    }

    pub fn list_imports(&self, repo_id: i64) -> Result<Vec<ImportRow>> {
        const OP: &str = "list imports";
        let conn = self.conn(OP)?;
        let mut stmt = conn
            .prepare(
                "SELECT f.path, i.source, i.items, i.kind, i.line, i.is_external
                 FROM imports i JOIN files f ON f.id = i.file_id
                 WHERE f.repository_id = ?1
                 ORDER BY f.path, i.line, i.id",
            )
            .storage(OP)?;
        let rows = stmt
            .query_map([repo_id], |row| {
                let items: String = row.get(2)?;
                Ok(ImportRow {
                    file_path: row.get(0)?,
                    source: row.get(1)?,
                    items: serde_json::from_str(&items).unwrap_or_default(),
                    kind: row.get(3)?,
                    line: row.get(4)?,
                    is_external: row.get(5)?,
                })
            })
            .storage(OP)?;
        rows.collect::<std::result::Result<Vec<_>, _>>().storage(OP)
    }

    pub fn list_exports(&self, repo_id: i64) -> Result<Vec<ExportRow>> {
        const OP: &str = "list exports";
        let conn = self.conn(OP)?;
        let mut stmt = conn
            .prepare(
                "SELECT f.path, e.name, e.kind, e.line, e.local_name
                 FROM exports e JOIN files f ON f.id = e.file_id
                 WHERE f.repository_id = ?1
                 ORDER BY e.name, f.path, e.line",
            )
            .storage(OP)?;
        let rows = stmt
            .query_map([repo_id], |row| {
                Ok(ExportRow {
                    file_path: row.get(0)?,
                    name: row.get(1)?,
                    kind: row.get(2)?,
                    line: row.get(3)?,
                    local_name: row.get(4)?,
                })
            })
            .storage(OP)?;
        rows.collect::<std::result::Result<Vec<_>, _>>().storage(OP)
    }

    /// (path, component) pairs, sorted by component then path
    pub fn file_components(&self, repo_id: i64) -> Result<Vec<(String, String)>> {
        const OP: &str = "list file components";
        let conn = self.conn(OP)?;
        let mut stmt = conn
            .prepare(
                "SELECT f.path, c.name
                 FROM file_components fc
                 JOIN files f ON f.id = fc.file_id
                 JOIN components c ON c.id = fc.component_id
                 WHERE f.repository_id = ?1
                 ORDER BY c.name, f.path",
            )
            .storage(OP)?;
        let rows = stmt
            .query_map([repo_id], |row| Ok((row.get(0)?, row.get(1)?)))
            .storage(OP)?;
        rows.collect::<std::result::Result<Vec<_>, _>>().storage(OP)
    }

    /// Write a consistent copy of the whole store to `dest`
    pub fn backup_to(&self, dest: &std::path::Path) -> Result<()> {
        const OP: &str = "backup";
        let dest = dest.to_string_lossy().into_owned();
        self.conn(OP)?
            .execute("VACUUM INTO ?1", [&dest])
            .storage(OP)?;
        Ok(())
    }
}

//! Mutating operations on the store
//!
//! `add_*` calls are plain inserts with no deduplication; the scanner clears a
//! file's children with `clear_file_children` before re-adding them.

use std::collections::HashSet;

use rusqlite::{params, OptionalExtension};

use super::{now_timestamp, Database, FileData, Repository, ScanTotals, UnresolvedDependency};
use crate::error::{IndexError, Result, StorageContext};
use crate::model::{
    ComponentCategory, DependencyKind, ExportData, FunctionData, ImportData, ScanKind, ScanStatus,
};

impl Database {
    // ========================================================================
    // Repository
    // ========================================================================

    /// Return the repository identified by `(owner, name)`, inserting it first
    /// if it does not exist. An existing row is never duplicated.
    pub fn get_or_create_repository(&self, owner: &str, name: &str, url: &str) -> Result<Repository> {
        const OP: &str = "get or create repository";
        let conn = self.conn(OP)?;
        conn.execute(
            "INSERT INTO repositories (owner, name, url) VALUES (?1, ?2, ?3)
             ON CONFLICT(owner, name) DO NOTHING",
            params![owner, name, url],
        )
        .storage(OP)?;

        self.find_repository(owner, name)?
            .ok_or_else(|| IndexError::NoRepository {
                owner: owner.to_string(),
                name: name.to_string(),
            })
    }

    /// Seal aggregate totals after a successful scan
    pub fn update_repository_totals(&self, repo_id: i64, total_files: usize, total_lines: usize) -> Result<()> {
        const OP: &str = "update repository totals";
        let now = now_timestamp();
        self.conn(OP)?
            .execute(
                "UPDATE repositories
                 SET total_files = ?2, total_lines = ?3, last_scan_at = ?4, updated_at = ?4
                 WHERE id = ?1",
                params![repo_id, total_files as i64, total_lines as i64, now],
            )
            .storage(OP)?;
        Ok(())
    }

    pub fn set_repository_version(&self, repo_id: i64, version: &str) -> Result<()> {
        const OP: &str = "set repository version";
        self.conn(OP)?
            .execute(
                "UPDATE repositories SET version = ?2 WHERE id = ?1",
                params![repo_id, version],
            )
            .storage(OP)?;
        Ok(())
    }

    // ========================================================================
    // Files
    // ========================================================================

    /// Insert or update the file at `(repo_id, data.path)`; the row id is
    /// stable across updates.
    pub fn upsert_file(&self, repo_id: i64, data: &FileData) -> Result<i64> {
        const OP: &str = "upsert file";
        let conn = self.conn(OP)?;
        let mut stmt = conn
            .prepare_cached(
                "INSERT INTO files (
                    repository_id, path, name, extension, file_type, size_bytes,
                    lines_count, code_lines, comment_lines, blank_lines,
                    hash, purpose, complexity_score, last_modified, indexed_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
                 ON CONFLICT(repository_id, path) DO UPDATE SET
                    name = excluded.name,
                    extension = excluded.extension,
                    file_type = excluded.file_type,
                    size_bytes = excluded.size_bytes,
                    lines_count = excluded.lines_count,
                    code_lines = excluded.code_lines,
                    comment_lines = excluded.comment_lines,
                    blank_lines = excluded.blank_lines,
                    hash = excluded.hash,
                    purpose = excluded.purpose,
                    complexity_score = excluded.complexity_score,
                    last_modified = excluded.last_modified,
                    indexed_at = excluded.indexed_at",
            )
            .storage(OP)?;
        stmt.execute(params![
            repo_id,
            data.path,
            data.name,
            data.extension,
            data.file_type,
            data.size_bytes as i64,
            data.lines.total as i64,
            data.lines.code as i64,
            data.lines.comment as i64,
            data.lines.blank as i64,
            data.hash,
            data.purpose,
            data.complexity_score as i64,
            data.last_modified,
            now_timestamp(),
        ])
        .storage(OP)?;

        // last_insert_rowid is stale on the UPDATE path of an upsert
        self.file_id(repo_id, &data.path)?
            .ok_or_else(|| IndexError::Constraint {
                operation: OP,
                entity: "files".to_string(),
                message: format!("row for {} vanished after upsert", data.path),
            })
    }

    /// Point an unresolved edge at `to_file_id` and mark it resolved
    pub fn resolve_dependency(&self, dependency_id: i64, to_file_id: i64) -> Result<()> {
        const OP: &str = "resolve dependency";
        self.conn(OP)?
            .prepare_cached(
                "UPDATE dependencies SET to_file_id = ?2, is_resolved = 1
                 WHERE id = ?1 AND to_file_id IS NULL",
            )
            .storage(OP)?
            .execute(params![dependency_id, to_file_id])
            .storage(OP)?;
        Ok(())
    }

    /// Delete a file's functions, imports, exports, outgoing dependencies and
    /// component tags. Incoming edges are untouched.
    pub fn clear_file_children(&self, file_id: i64) -> Result<()> {
        const OP: &str = "clear file children";
        let conn = self.conn(OP)?;
        for sql in [
            "DELETE FROM functions WHERE file_id = ?1",
            "DELETE FROM imports WHERE file_id = ?1",
            "DELETE FROM exports WHERE file_id = ?1",
            "DELETE FROM dependencies WHERE from_file_id = ?1",
            "DELETE FROM file_components WHERE file_id = ?1",
        ] {
            conn.prepare_cached(sql)
                .storage(OP)?
                .execute([file_id])
                .storage(OP)?;
        }
        Ok(())
    }

    /// Delete every file of `repo_id` whose path is not in `keep`. Edges that
    /// pointed at a deleted file become unresolved. Returns the number deleted.
    pub fn prune_files(&self, repo_id: i64, keep: &HashSet<String>) -> Result<usize> {
        const OP: &str = "prune files";
        let conn = self.conn(OP)?;
        let stale: Vec<(i64, String)> = {
            let mut stmt = conn
                .prepare("SELECT id, path FROM files WHERE repository_id = ?1")
                .storage(OP)?;
            let rows = stmt
                .query_map([repo_id], |row| Ok((row.get(0)?, row.get(1)?)))
                .storage(OP)?;
            rows.collect::<std::result::Result<Vec<(i64, String)>, _>>()
                .storage(OP)?
                .into_iter()
                .filter(|(_, path)| !keep.contains(path))
                .collect()
        };

        for (id, path) in &stale {
            conn.prepare_cached(
                "UPDATE dependencies SET to_file_id = NULL, is_resolved = 0 WHERE to_file_id = ?1",
            )
            .storage(OP)?
            .execute([id])
            .storage(OP)?;
            conn.prepare_cached("DELETE FROM files WHERE id = ?1")
                .storage(OP)?
                .execute([id])
                .storage(OP)?;
            tracing::debug!("pruned {}", path);
        }
        Ok(stale.len())
    }

    // ========================================================================
    // File children
    // ========================================================================

    pub fn add_function(&self, file_id: i64, function: &FunctionData) -> Result<i64> {
        const OP: &str = "add function";
        let conn = self.conn(OP)?;
        conn.prepare_cached(
            "INSERT INTO functions (
                file_id, name, signature, start_line, end_line,
                is_async, is_exported, is_arrow, complexity, purpose
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .storage(OP)?
        .execute(params![
            file_id,
            function.name,
            function.signature,
            function.start_line as i64,
            function.end_line as i64,
            function.is_async,
            function.is_exported,
            function.is_arrow,
            function.complexity as i64,
            function.purpose,
        ])
        .storage(OP)?;
        Ok(conn.last_insert_rowid())
    }

    pub fn add_import(&self, file_id: i64, import: &ImportData) -> Result<i64> {
        const OP: &str = "add import";
        let conn = self.conn(OP)?;
        let items = serde_json::to_string(&import.items)?;
        conn.prepare_cached(
            "INSERT INTO imports (file_id, source, items, kind, line, is_external)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .storage(OP)?
        .execute(params![
            file_id,
            import.source,
            items,
            import.kind.as_str(),
            import.line as i64,
            import.is_external,
        ])
        .storage(OP)?;
        Ok(conn.last_insert_rowid())
    }

    pub fn add_export(&self, file_id: i64, export: &ExportData) -> Result<i64> {
        const OP: &str = "add export";
        let conn = self.conn(OP)?;
        conn.prepare_cached(
            "INSERT INTO exports (file_id, name, kind, line, local_name)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .storage(OP)?
        .execute(params![
            file_id,
            export.name,
            export.kind.as_str(),
            export.line as i64,
            export.local_name,
        ])
        .storage(OP)?;
        Ok(conn.last_insert_rowid())
    }

    /// Record an edge; `is_resolved` is derived from `to_file_id`.
    pub fn add_dependency(
        &self,
        from_file_id: i64,
        to_file_id: Option<i64>,
        kind: DependencyKind,
        import_path: &str,
    ) -> Result<i64> {
        const OP: &str = "add dependency";
        let conn = self.conn(OP)?;
        conn.prepare_cached(
            "INSERT INTO dependencies (from_file_id, to_file_id, kind, import_path, is_resolved)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .storage(OP)?
        .execute(params![
            from_file_id,
            to_file_id,
            kind.as_str(),
            import_path,
            to_file_id.is_some(),
        ])
        .storage(OP)?;
        Ok(conn.last_insert_rowid())
    }

    pub fn tag_file_component(&self, file_id: i64, component: ComponentCategory) -> Result<()> {
        const OP: &str = "tag file component";
        self.conn(OP)?
            .prepare_cached(
                "INSERT OR IGNORE INTO file_components (file_id, component_id)
                 SELECT ?1, id FROM components WHERE name = ?2",
            )
            .storage(OP)?
            .execute(params![file_id, component.as_str()])
            .storage(OP)?;
        Ok(())
    }

    // ========================================================================
    // Scans
    // ========================================================================

    /// Open a scan in `running` state
    pub fn start_scan(&self, repo_id: i64, kind: ScanKind) -> Result<i64> {
        const OP: &str = "start scan";
        let conn = self.conn(OP)?;
        conn.execute(
            "INSERT INTO scans (repository_id, kind, status, started_at) VALUES (?1, ?2, ?3, ?4)",
            params![repo_id, kind.as_str(), ScanStatus::Running.as_str(), now_timestamp()],
        )
        .storage(OP)?;
        Ok(conn.last_insert_rowid())
    }

    pub fn complete_scan(&self, scan_id: i64, totals: &ScanTotals) -> Result<()> {
        self.finish_scan(scan_id, ScanStatus::Completed, totals, None)
    }

    pub fn fail_scan(&self, scan_id: i64, totals: &ScanTotals, message: &str) -> Result<()> {
        self.finish_scan(scan_id, ScanStatus::Failed, totals, Some(message))
    }

    // Only a running scan can be sealed; sealed rows are never touched again.
    fn finish_scan(
        &self,
        scan_id: i64,
        status: ScanStatus,
        totals: &ScanTotals,
        message: Option<&str>,
    ) -> Result<()> {
        const OP: &str = "finish scan";
        let changed = self
            .conn(OP)?
            .execute(
                "UPDATE scans
                 SET status = ?2, finished_at = ?3, files_scanned = ?4, lines_scanned = ?5,
                     functions_found = ?6, error_count = ?7, error_message = ?8
                 WHERE id = ?1 AND status = 'running'",
                params![
                    scan_id,
                    status.as_str(),
                    now_timestamp(),
                    totals.files_scanned as i64,
                    totals.lines_scanned as i64,
                    totals.functions_found as i64,
                    totals.error_count as i64,
                    message,
                ],
            )
            .storage(OP)?;
        if changed == 0 {
            return Err(IndexError::InvalidArgument {
                message: format!("scan {} is not running", scan_id),
            });
        }
        Ok(())
    }

    // ========================================================================
    // Languages
    // ========================================================================

    pub fn upsert_language(
        &self,
        repo_id: i64,
        name: &str,
        file_count: usize,
        total_lines: usize,
        percentage: f64,
    ) -> Result<()> {
        const OP: &str = "upsert language";
        self.conn(OP)?
            .prepare_cached(
                "INSERT INTO languages (repository_id, name, file_count, total_lines, percentage)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(repository_id, name) DO UPDATE SET
                    file_count = excluded.file_count,
                    total_lines = excluded.total_lines,
                    percentage = excluded.percentage",
            )
            .storage(OP)?
            .execute(params![
                repo_id,
                name,
                file_count as i64,
                total_lines as i64,
                percentage
            ])
            .storage(OP)?;
        Ok(())
    }

    /// Drop language rows whose name is not in `names`
    pub fn retain_languages(&self, repo_id: i64, names: &[&str]) -> Result<usize> {
        const OP: &str = "retain languages";
        let conn = self.conn(OP)?;
        let existing: Vec<String> = {
            let mut stmt = conn
                .prepare("SELECT name FROM languages WHERE repository_id = ?1")
                .storage(OP)?;
            let rows = stmt.query_map([repo_id], |row| row.get(0)).storage(OP)?;
            rows.collect::<std::result::Result<Vec<String>, _>>()
                .storage(OP)?
        };

        let mut removed = 0;
        for name in existing.iter().filter(|n| !names.contains(&n.as_str())) {
            removed += conn
                .execute(
                    "DELETE FROM languages WHERE repository_id = ?1 AND name = ?2",
                    params![repo_id, name],
                )
                .storage(OP)?;
        }
        Ok(removed)
    }

    // ========================================================================
    // Lookups used while writing
    // ========================================================================

    pub fn file_id(&self, repo_id: i64, path: &str) -> Result<Option<i64>> {
        const OP: &str = "look up file";
        self.conn(OP)?
            .prepare_cached("SELECT id FROM files WHERE repository_id = ?1 AND path = ?2")
            .storage(OP)?
            .query_row(params![repo_id, path], |row| row.get(0))
            .optional()
            .storage(OP)
    }

    /// Stored fingerprint, `None` for unknown paths
    pub fn file_hash(&self, repo_id: i64, path: &str) -> Result<Option<String>> {
        const OP: &str = "look up file hash";
        let hash: Option<Option<String>> = self
            .conn(OP)?
            .prepare_cached("SELECT hash FROM files WHERE repository_id = ?1 AND path = ?2")
            .storage(OP)?
            .query_row(params![repo_id, path], |row| row.get(0))
            .optional()
            .storage(OP)?;
        Ok(hash.flatten())
    }

    /// Stored line count for `path`, if indexed
    pub fn file_lines(&self, repo_id: i64, path: &str) -> Result<Option<usize>> {
        const OP: &str = "look up file lines";
        let lines: Option<i64> = self
            .conn(OP)?
            .prepare_cached("SELECT lines_count FROM files WHERE repository_id = ?1 AND path = ?2")
            .storage(OP)?
            .query_row(params![repo_id, path], |row| row.get(0))
            .optional()
            .storage(OP)?;
        Ok(lines.map(|l| l.max(0) as usize))
    }

    /// Paths of files that were analyzed and stored with a fingerprint, sorted
    pub fn indexed_paths(&self, repo_id: i64) -> Result<Vec<String>> {
        const OP: &str = "list indexed paths";
        let conn = self.conn(OP)?;
        let mut stmt = conn
            .prepare(
                "SELECT path FROM files
                 WHERE repository_id = ?1 AND hash IS NOT NULL
                 ORDER BY path",
            )
            .storage(OP)?;
        let rows = stmt.query_map([repo_id], |row| row.get(0)).storage(OP)?;
        rows.collect::<std::result::Result<Vec<String>, _>>()
            .storage(OP)
    }

    /// Edges of `repo_id` that have no target file yet, in insertion order
    pub fn unresolved_dependencies(&self, repo_id: i64) -> Result<Vec<UnresolvedDependency>> {
        const OP: &str = "list unresolved dependencies";
        let conn = self.conn(OP)?;
        let mut stmt = conn
            .prepare(
                "SELECT d.id, f.path, d.import_path
                 FROM dependencies d
                 JOIN files f ON f.id = d.from_file_id
                 WHERE f.repository_id = ?1 AND d.to_file_id IS NULL
                 ORDER BY d.id",
            )
            .storage(OP)?;
        let rows = stmt
            .query_map([repo_id], |row| {
                Ok(UnresolvedDependency {
                    id: row.get(0)?,
                    from_path: row.get(1)?,
                    import_path: row.get(2)?,
                })
            })
            .storage(OP)?;
        rows.collect::<std::result::Result<Vec<_>, _>>().storage(OP)
    }

    /// Every path of a repository, sorted
    pub fn file_paths(&self, repo_id: i64) -> Result<Vec<String>> {
        const OP: &str = "list file paths";
        let conn = self.conn(OP)?;
        let mut stmt = conn
            .prepare("SELECT path FROM files WHERE repository_id = ?1 ORDER BY path")
            .storage(OP)?;
        let rows = stmt.query_map([repo_id], |row| row.get(0)).storage(OP)?;
        rows.collect::<std::result::Result<Vec<String>, _>>()
            .storage(OP)
    }
}

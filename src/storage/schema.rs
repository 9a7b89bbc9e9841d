//! Relational schema for the repository index
//!
//! Tables for every persisted entity, two FTS5 external-content indexes kept in
//! sync by triggers, and the read-optimized views used by reporting. The DDL is
//! idempotent (`IF NOT EXISTS` everywhere) and is applied on every open.

use rusqlite::Connection;

use crate::error::{Result, StorageContext};
use crate::model::ComponentCategory;

/// Schema version stamped into `PRAGMA user_version`
pub const SCHEMA_VERSION: i32 = 1;

const TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS repositories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner TEXT NOT NULL,
    name TEXT NOT NULL,
    url TEXT NOT NULL DEFAULT '',
    version TEXT,
    total_files INTEGER NOT NULL DEFAULT 0,
    total_lines INTEGER NOT NULL DEFAULT 0,
    last_scan_at TEXT,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
    UNIQUE (owner, name)
);

CREATE TABLE IF NOT EXISTS scans (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    repository_id INTEGER NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
    kind TEXT NOT NULL DEFAULT 'full'
        CONSTRAINT scans_kind_check CHECK (kind IN ('full', 'incremental', 'partial')),
    status TEXT NOT NULL DEFAULT 'running'
        CONSTRAINT scans_status_check CHECK (status IN ('running', 'completed', 'failed')),
    started_at TEXT NOT NULL,
    finished_at TEXT,
    files_scanned INTEGER NOT NULL DEFAULT 0,
    lines_scanned INTEGER NOT NULL DEFAULT 0,
    functions_found INTEGER NOT NULL DEFAULT 0,
    error_count INTEGER NOT NULL DEFAULT 0,
    error_message TEXT
);

CREATE TABLE IF NOT EXISTS files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    repository_id INTEGER NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
    path TEXT NOT NULL,
    name TEXT NOT NULL,
    extension TEXT NOT NULL DEFAULT '',
    file_type TEXT NOT NULL DEFAULT 'unknown',
    size_bytes INTEGER NOT NULL DEFAULT 0,
    lines_count INTEGER NOT NULL DEFAULT 0,
    code_lines INTEGER NOT NULL DEFAULT 0,
    comment_lines INTEGER NOT NULL DEFAULT 0,
    blank_lines INTEGER NOT NULL DEFAULT 0,
    hash TEXT,
    purpose TEXT NOT NULL DEFAULT '',
    complexity_score INTEGER NOT NULL DEFAULT 0,
    last_modified TEXT,
    indexed_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now')),
    UNIQUE (repository_id, path)
);

CREATE TABLE IF NOT EXISTS functions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_id INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    signature TEXT NOT NULL DEFAULT '',
    start_line INTEGER NOT NULL CHECK (start_line >= 1),
    end_line INTEGER NOT NULL CHECK (end_line >= start_line),
    is_async INTEGER NOT NULL DEFAULT 0,
    is_exported INTEGER NOT NULL DEFAULT 0,
    is_arrow INTEGER NOT NULL DEFAULT 0,
    complexity INTEGER NOT NULL DEFAULT 1 CHECK (complexity >= 1),
    purpose TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_id INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    source TEXT NOT NULL,
    items TEXT NOT NULL DEFAULT '[]',
    kind TEXT NOT NULL
        CONSTRAINT imports_kind_check CHECK (kind IN ('default', 'named', 'namespace', 'dynamic')),
    line INTEGER NOT NULL,
    is_external INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS exports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_id INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    kind TEXT NOT NULL
        CONSTRAINT exports_kind_check CHECK (kind IN ('default', 'named', 'namespace')),
    line INTEGER NOT NULL,
    local_name TEXT
);

CREATE TABLE IF NOT EXISTS dependencies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    from_file_id INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    to_file_id INTEGER REFERENCES files(id) ON DELETE SET NULL,
    kind TEXT NOT NULL
        CONSTRAINT dependencies_kind_check CHECK (kind IN ('import', 'require', 'dynamic')),
    import_path TEXT NOT NULL,
    is_resolved INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS languages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    repository_id INTEGER NOT NULL REFERENCES repositories(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    file_count INTEGER NOT NULL DEFAULT 0,
    total_lines INTEGER NOT NULL DEFAULT 0,
    percentage REAL NOT NULL DEFAULT 0,
    UNIQUE (repository_id, name)
);

CREATE TABLE IF NOT EXISTS components (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS file_components (
    file_id INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
    component_id INTEGER NOT NULL REFERENCES components(id) ON DELETE CASCADE,
    PRIMARY KEY (file_id, component_id)
);
"#;

const INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_scans_repository ON scans(repository_id);
CREATE INDEX IF NOT EXISTS idx_scans_status ON scans(status);
CREATE INDEX IF NOT EXISTS idx_files_repository ON files(repository_id);
CREATE INDEX IF NOT EXISTS idx_files_path ON files(path);
CREATE INDEX IF NOT EXISTS idx_files_hash ON files(hash);
CREATE INDEX IF NOT EXISTS idx_files_name ON files(name);
CREATE INDEX IF NOT EXISTS idx_files_type ON files(file_type);
CREATE INDEX IF NOT EXISTS idx_files_complexity ON files(complexity_score);
CREATE INDEX IF NOT EXISTS idx_functions_file ON functions(file_id);
CREATE INDEX IF NOT EXISTS idx_functions_name ON functions(name);
CREATE INDEX IF NOT EXISTS idx_functions_exported ON functions(is_exported);
CREATE INDEX IF NOT EXISTS idx_imports_file ON imports(file_id);
CREATE INDEX IF NOT EXISTS idx_imports_source ON imports(source);
CREATE INDEX IF NOT EXISTS idx_exports_file ON exports(file_id);
CREATE INDEX IF NOT EXISTS idx_exports_name ON exports(name);
CREATE INDEX IF NOT EXISTS idx_dependencies_from ON dependencies(from_file_id);
CREATE INDEX IF NOT EXISTS idx_dependencies_to ON dependencies(to_file_id);
CREATE INDEX IF NOT EXISTS idx_languages_repository ON languages(repository_id);
CREATE INDEX IF NOT EXISTS idx_file_components_component ON file_components(component_id);
"#;

// External-content FTS5 tables: the triggers are the only thing keeping them
// consistent with `files` / `functions`, so every mutation path must go
// through the base tables.
const FULL_TEXT: &str = r#"
CREATE VIRTUAL TABLE IF NOT EXISTS files_fts USING fts5(
    name, path, purpose,
    content='files', content_rowid='id'
);

CREATE TRIGGER IF NOT EXISTS files_fts_ai AFTER INSERT ON files BEGIN
    INSERT INTO files_fts(rowid, name, path, purpose)
    VALUES (new.id, new.name, new.path, new.purpose);
END;

CREATE TRIGGER IF NOT EXISTS files_fts_ad AFTER DELETE ON files BEGIN
    INSERT INTO files_fts(files_fts, rowid, name, path, purpose)
    VALUES ('delete', old.id, old.name, old.path, old.purpose);
END;

CREATE TRIGGER IF NOT EXISTS files_fts_au AFTER UPDATE ON files BEGIN
    INSERT INTO files_fts(files_fts, rowid, name, path, purpose)
    VALUES ('delete', old.id, old.name, old.path, old.purpose);
    INSERT INTO files_fts(rowid, name, path, purpose)
    VALUES (new.id, new.name, new.path, new.purpose);
END;

CREATE VIRTUAL TABLE IF NOT EXISTS functions_fts USING fts5(
    name, signature, purpose,
    content='functions', content_rowid='id'
);

CREATE TRIGGER IF NOT EXISTS functions_fts_ai AFTER INSERT ON functions BEGIN
    INSERT INTO functions_fts(rowid, name, signature, purpose)
    VALUES (new.id, new.name, new.signature, new.purpose);
END;

CREATE TRIGGER IF NOT EXISTS functions_fts_ad AFTER DELETE ON functions BEGIN
    INSERT INTO functions_fts(functions_fts, rowid, name, signature, purpose)
    VALUES ('delete', old.id, old.name, old.signature, old.purpose);
END;

CREATE TRIGGER IF NOT EXISTS functions_fts_au AFTER UPDATE ON functions BEGIN
    INSERT INTO functions_fts(functions_fts, rowid, name, signature, purpose)
    VALUES ('delete', old.id, old.name, old.signature, old.purpose);
    INSERT INTO functions_fts(rowid, name, signature, purpose)
    VALUES (new.id, new.name, new.signature, new.purpose);
END;
"#;

const VIEWS: &str = r#"
CREATE VIEW IF NOT EXISTS v_file_details AS
SELECT
    f.id, f.repository_id, f.path, f.name, f.extension, f.file_type,
    f.size_bytes, f.lines_count, f.code_lines, f.comment_lines, f.blank_lines,
    f.hash, f.purpose, f.complexity_score, f.indexed_at,
    (SELECT COUNT(*) FROM functions fn WHERE fn.file_id = f.id) AS function_count,
    (SELECT COUNT(*) FROM imports i WHERE i.file_id = f.id) AS import_count,
    (SELECT COUNT(*) FROM exports e WHERE e.file_id = f.id) AS export_count,
    (SELECT COUNT(*) FROM dependencies d WHERE d.from_file_id = f.id) AS dependency_count,
    (SELECT COUNT(*) FROM dependencies d WHERE d.to_file_id = f.id) AS dependent_count
FROM files f;

CREATE VIEW IF NOT EXISTS v_dependency_graph AS
SELECT
    d.id, src.repository_id,
    d.from_file_id, src.path AS from_path,
    d.to_file_id, dst.path AS to_path,
    d.kind, d.import_path, d.is_resolved
FROM dependencies d
JOIN files src ON src.id = d.from_file_id
LEFT JOIN files dst ON dst.id = d.to_file_id;

CREATE VIEW IF NOT EXISTS v_language_summary AS
SELECT
    l.repository_id, l.name, l.file_count, l.total_lines, l.percentage,
    (SELECT COALESCE(SUM(f.code_lines), 0) FROM files f
        WHERE f.repository_id = l.repository_id AND f.file_type = l.name) AS code_lines
FROM languages l;

CREATE VIEW IF NOT EXISTS v_component_summary AS
SELECT
    f.repository_id, c.name, c.description,
    COUNT(fc.file_id) AS file_count,
    COALESCE(SUM(f.lines_count), 0) AS total_lines
FROM components c
JOIN file_components fc ON fc.component_id = c.id
JOIN files f ON f.id = fc.file_id
GROUP BY f.repository_id, c.id;

CREATE VIEW IF NOT EXISTS v_function_summary AS
SELECT
    fn.id, f.repository_id, fn.file_id, f.path AS file_path,
    fn.name, fn.signature, fn.start_line, fn.end_line,
    fn.end_line - fn.start_line + 1 AS line_span,
    fn.is_async, fn.is_exported, fn.is_arrow, fn.complexity, fn.purpose
FROM functions fn
JOIN files f ON f.id = fn.file_id;
"#;

/// Apply the full schema and seed the component taxonomy.
pub fn apply(conn: &Connection) -> Result<()> {
    conn.execute_batch(TABLES).storage("create tables")?;
    conn.execute_batch(INDEXES).storage("create indexes")?;
    conn.execute_batch(FULL_TEXT).storage("create full-text indexes")?;
    conn.execute_batch(VIEWS).storage("create views")?;
    seed_components(conn)?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)
        .storage("set schema version")?;
    Ok(())
}

fn seed_components(conn: &Connection) -> Result<()> {
    let mut stmt = conn
        .prepare_cached("INSERT OR IGNORE INTO components (name, description) VALUES (?1, ?2)")
        .storage("seed components")?;
    for category in ComponentCategory::ALL {
        stmt.execute(rusqlite::params![category.as_str(), category.description()])
            .storage("seed components")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object_names(conn: &Connection, kind: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = ?1 ORDER BY name")
            .unwrap();
        stmt.query_map([kind], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<String>, _>>()
            .unwrap()
    }

    #[test]
    fn test_apply_creates_every_object() {
        let conn = Connection::open_in_memory().unwrap();
        apply(&conn).unwrap();

        let tables = object_names(&conn, "table");
        for table in [
            "repositories",
            "scans",
            "files",
            "functions",
            "imports",
            "exports",
            "dependencies",
            "languages",
            "components",
            "file_components",
            "files_fts",
            "functions_fts",
        ] {
            assert!(tables.contains(&table.to_string()), "missing table {}", table);
        }

        let views = object_names(&conn, "view");
        assert_eq!(
            views,
            vec![
                "v_component_summary",
                "v_dependency_graph",
                "v_file_details",
                "v_function_summary",
                "v_language_summary",
            ]
        );

        let triggers = object_names(&conn, "trigger");
        assert_eq!(triggers.len(), 6);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        apply(&conn).unwrap();
        apply(&conn).unwrap();

        let components: i64 = conn
            .query_row("SELECT COUNT(*) FROM components", [], |row| row.get(0))
            .unwrap();
        assert_eq!(components, 7);
    }

    #[test]
    fn test_check_constraint_rejects_unknown_status() {
        let conn = Connection::open_in_memory().unwrap();
        apply(&conn).unwrap();
        conn.execute(
            "INSERT INTO repositories (owner, name) VALUES ('o', 'n')",
            [],
        )
        .unwrap();

        let err = conn
            .execute(
                "INSERT INTO scans (repository_id, status, started_at) VALUES (1, 'paused', 'now')",
                [],
            )
            .unwrap_err();
        let err = crate::error::IndexError::from_sqlite("start scan", err);
        assert!(err.is_constraint_violation());
    }
}

//! Storage access layer
//!
//! `Database` is the only mutation and query boundary over the schema. Writes
//! live in [`writes`], reads in [`queries`]; both are `impl Database` blocks
//! sharing the connection handle defined here.
//!
//! Concurrency: WAL journal with a 5s busy timeout, so readers never block on
//! an in-flight scan. Write transactions use `BEGIN IMMEDIATE` and SQLite
//! serializes writers; running two scans against the same store at once is
//! not supported.

pub mod models;
pub mod queries;
pub mod schema;
pub mod writes;

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use rusqlite::Connection;

use crate::error::{IndexError, Result, StorageContext};

pub use models::*;

const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Handle over one SQLite store
pub struct Database {
    conn: Option<Connection>,
    path: Option<PathBuf>,
}

impl Database {
    /// Open (or create) the store at `path`, creating parent directories and
    /// applying the schema.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path).storage("open database")?;
        let db = Self::init(conn, Some(path.to_path_buf()))?;
        tracing::debug!("opened store at {}", path.display());
        Ok(db)
    }

    /// Private in-memory store, used by tests and benchmarks
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().storage("open database")?;
        Self::init(conn, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        // In-memory stores report "memory" here; that is fine.
        let _mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .storage("configure journal")?;
        conn.pragma_update(None, "foreign_keys", true)
            .storage("enable foreign keys")?;
        conn.busy_timeout(BUSY_TIMEOUT).storage("set busy timeout")?;
        schema::apply(&conn)?;
        Ok(Self {
            conn: Some(conn),
            path,
        })
    }

    /// On-disk location, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        self.conn.is_none()
    }

    /// Release the connection. Calling it again is a no-op; any other
    /// operation afterwards fails with `IndexError::Closed`.
    pub fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close()
                .map_err(|(_, e)| IndexError::from_sqlite("close database", e))?;
        }
        Ok(())
    }

    pub(crate) fn conn(&self, operation: &'static str) -> Result<&Connection> {
        self.conn
            .as_ref()
            .ok_or(IndexError::Closed { operation })
    }

    /// Run `body` inside an IMMEDIATE transaction. Commits on `Ok`, rolls back
    /// on `Err` and hands the error back unchanged. Not reentrant.
    pub fn transaction<T, F>(&self, body: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        let conn = self.conn("begin transaction")?;
        conn.execute_batch("BEGIN IMMEDIATE")
            .storage("begin transaction")?;
        match body(self) {
            Ok(value) => {
                conn.execute_batch("COMMIT").storage("commit transaction")?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = conn.execute_batch("ROLLBACK") {
                    tracing::warn!("rollback failed: {}", rollback);
                }
                Err(e)
            }
        }
    }
}

impl Drop for Database {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!("{}", e);
        }
    }
}

/// UTC timestamp in the format stored on every row
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Bind value for an optional `LIMIT`; SQLite treats a negative limit as none
pub(crate) fn sql_limit(limit: Option<usize>) -> i64 {
    limit
        .map(|l| i64::try_from(l).unwrap_or(i64::MAX))
        .unwrap_or(-1)
}

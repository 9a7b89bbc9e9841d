//! Error types and exit codes for repo-index

use std::process::ExitCode;
use thiserror::Error;

/// Main error type for repo-index operations
#[derive(Error, Debug)]
pub enum IndexError {
    /// Generic storage failure (connection, malformed SQL, parameter mismatch)
    #[error("Storage error during {operation}: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// A unique, foreign-key, check or trigger constraint rejected the write
    #[error("Constraint violation on {entity} during {operation}: {message}")]
    Constraint {
        operation: &'static str,
        entity: String,
        message: String,
    },

    #[error("Database is closed (attempted {operation})")]
    Closed { operation: &'static str },

    #[error("Cannot categorize file: {path}")]
    Uncategorized { path: String },

    #[error("Cannot read {path}: {message}")]
    Unreadable { path: String, message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("No indexed repository {owner}/{name}. Run `repo-index scan` first.")]
    NoRepository { owner: String, name: String },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Path {path} escapes {base}")]
    PathEscape { path: String, base: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Git error: {message}")]
    Git { message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IndexError {
    /// Every reported error maps to exit status 1
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from(1)
    }

    /// True for per-file failures the scanner counts and skips
    pub fn is_analysis_error(&self) -> bool {
        matches!(self, Self::Uncategorized { .. } | Self::Unreadable { .. })
    }

    /// True when the error came from a violated storage constraint
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Constraint { .. })
    }

    /// Classify a rusqlite error raised by `operation`.
    pub fn from_sqlite(operation: &'static str, err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref code, ref message)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                let message = message.clone().unwrap_or_else(|| code.to_string());
                Self::Constraint {
                    operation,
                    entity: constraint_entity(&message),
                    message,
                }
            }
            other => Self::Storage {
                operation,
                source: other,
            },
        }
    }
}

/// Pull the table (or constraint name) out of a SQLite constraint message.
///
/// `UNIQUE constraint failed: files.repository_id, files.path` yields `files`,
/// `CHECK constraint failed: scans_status_check` yields `scans_status_check`.
fn constraint_entity(message: &str) -> String {
    if message.starts_with("FOREIGN KEY") {
        return "foreign_key".to_string();
    }
    match message.split_once(": ") {
        Some((_, detail)) => detail
            .split(|c| c == '.' || c == ',' || c == ' ')
            .next()
            .unwrap_or(detail)
            .to_string(),
        None => message.to_string(),
    }
}

/// Attach the failing operation to rusqlite results.
pub trait StorageContext<T> {
    fn storage(self, operation: &'static str) -> Result<T>;
}

impl<T> StorageContext<T> for std::result::Result<T, rusqlite::Error> {
    fn storage(self, operation: &'static str) -> Result<T> {
        self.map_err(|e| IndexError::from_sqlite(operation, e))
    }
}

/// Result type alias for repo-index operations
pub type Result<T> = std::result::Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_entity_from_unique_message() {
        assert_eq!(
            constraint_entity("UNIQUE constraint failed: files.repository_id, files.path"),
            "files"
        );
    }

    #[test]
    fn test_constraint_entity_from_check_and_fk() {
        assert_eq!(
            constraint_entity("CHECK constraint failed: scans_status_check"),
            "scans_status_check"
        );
        assert_eq!(constraint_entity("FOREIGN KEY constraint failed"), "foreign_key");
    }

    #[test]
    fn test_analysis_errors_are_classified() {
        let err = IndexError::Uncategorized {
            path: "a.bin".to_string(),
        };
        assert!(err.is_analysis_error());
        assert!(!err.is_constraint_violation());
    }
}

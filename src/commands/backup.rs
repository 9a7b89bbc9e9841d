//! Backup command handler - Copy the store into the backup directory

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::cli::BackupArgs;
use crate::commands::{to_json, CommandContext};
use crate::error::{IndexError, Result};
use crate::fs_utils;

/// Default backup file name for the current time
pub fn timestamped_name() -> String {
    format!("repository-{}.db", Utc::now().format("%Y%m%d-%H%M%S"))
}

/// Validate `name` against `backup_dir` and return the destination.
///
/// The destination must stay strictly inside the backup directory and must
/// not exist yet. Nothing is created on failure.
pub fn backup_destination(backup_dir: &Path, name: Option<&Path>) -> Result<PathBuf> {
    let default_name;
    let name = match name {
        Some(name) => name,
        None => {
            default_name = PathBuf::from(timestamped_name());
            &default_name
        }
    };
    let dest = fs_utils::ensure_within(backup_dir, name)?;
    if dest.exists() {
        return Err(IndexError::InvalidArgument {
            message: format!("backup {} already exists", dest.display()),
        });
    }
    Ok(dest)
}

/// Run the backup command
pub fn run_backup(args: &BackupArgs, ctx: &CommandContext) -> Result<String> {
    let config = ctx.config()?;
    let dest = backup_destination(&config.backup_dir, args.name.as_deref())?;
    let (db, _) = ctx.open_existing(&config)?;

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent)?;
    }
    db.backup_to(&dest)?;
    tracing::info!("backed up {} to {}", config.db_path.display(), dest.display());

    let size = std::fs::metadata(&dest).map(|m| m.len()).unwrap_or(0);
    if ctx.is_json() {
        return to_json(&serde_json::json!({
            "backup": dest.display().to_string(),
            "size_bytes": size,
        }));
    }
    Ok(format!("Backup written to {} ({} bytes)\n", dest.display(), size))
}

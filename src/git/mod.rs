//! Git integration for repository identity
//!
//! Uses subprocess calls to git for maximum compatibility; nothing here is
//! required for indexing to work.

mod remote;

pub use remote::{parse_remote_url, RemoteUrl};

use std::path::Path;
use std::process::Command;

use crate::error::{IndexError, Result};

/// Run a git command and return stdout as string
pub fn git_command(args: &[&str], cwd: Option<&Path>) -> Result<String> {
    let mut cmd = Command::new("git");
    cmd.args(args);

    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let output = cmd.output().map_err(|e| IndexError::Git {
        message: format!("Failed to execute git: {}", e),
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(IndexError::Git {
            message: format!("git {} failed: {}", args.join(" "), stderr.trim()),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Run a git command, returning None if it fails (for optional queries)
pub fn git_command_optional(args: &[&str], cwd: Option<&Path>) -> Option<String> {
    git_command(args, cwd).ok()
}

/// URL of the `origin` remote of the repository containing `root`
pub fn origin_url(root: &Path) -> Option<String> {
    git_command_optional(&["remote", "get-url", "origin"], Some(root)).filter(|url| !url.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_origin_url_outside_repository() {
        let dir = TempDir::new().unwrap();
        // Either git is missing or the directory is not a repository
        assert_eq!(origin_url(dir.path()), None);
    }
}

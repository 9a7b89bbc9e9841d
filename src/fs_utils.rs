//! Filesystem helpers shared by the scanner, artifact writer and backup
//!
//! - `normalize_path`: Strips Windows `\\?\` prefix from canonicalized paths
//! - `atomic_rename` / `write_atomic`: Replace a file without exposing partial writes
//! - `normalize_lexically` / `ensure_within`: Path confinement without touching the disk
//! - `relative_slash_path`: Repository-relative paths with `/` separators

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::{IndexError, Result};

/// Normalize Windows paths by removing the `\\?\` prefix if present.
///
/// `Path::canonicalize()` on Windows returns extended-length paths
/// (`\\?\C:\...`) that break string comparison and display. No-op on Unix.
pub fn normalize_path(path: &Path) -> PathBuf {
    #[cfg(windows)]
    {
        let s = path.to_string_lossy();
        if let Some(stripped) = s.strip_prefix(r"\\?\UNC\") {
            return PathBuf::from(format!(r"\\{}", stripped));
        }
        if let Some(stripped) = s.strip_prefix(r"\\?\") {
            return PathBuf::from(stripped);
        }
    }
    path.to_path_buf()
}

/// Rename that replaces an existing target on every platform.
///
/// On Windows `fs::rename` fails if the target exists, so it is deleted first.
pub fn atomic_rename(src: &Path, dst: &Path) -> io::Result<()> {
    #[cfg(windows)]
    {
        if dst.exists() {
            std::fs::remove_file(dst)?;
        }
    }
    std::fs::rename(src, dst)
}

/// Write `contents` to a sibling temp file and rename it over `path`
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));
    std::fs::write(&tmp, contents)?;
    atomic_rename(&tmp, path)
}

/// Resolve `.` and `..` components without consulting the filesystem.
///
/// `..` never climbs above the root of an absolute path; on a relative path
/// leading `..` components are kept.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolve `candidate` against `base` and require the result to stay strictly
/// inside `base`. Absolute candidates are checked as given.
pub fn ensure_within(base: &Path, candidate: &Path) -> Result<PathBuf> {
    let base = normalize_lexically(base);
    let resolved = normalize_lexically(&base.join(candidate));
    if resolved != base && resolved.starts_with(&base) {
        Ok(resolved)
    } else {
        Err(IndexError::PathEscape {
            path: candidate.display().to_string(),
            base: base.display().to_string(),
        })
    }
}

/// `path` relative to `root`, joined with `/`; `None` when outside `root`
pub fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_path_unix_unchanged() {
        #[cfg(not(windows))]
        {
            let path = PathBuf::from("/home/user/repo");
            assert_eq!(normalize_path(&path), path);
        }
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("data").join("metrics.json");

        write_atomic(&target, b"first").unwrap();
        write_atomic(&target, b"second").unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "second");
        let leftovers: Vec<_> = std::fs::read_dir(target.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_normalize_lexically() {
        assert_eq!(
            normalize_lexically(Path::new("/a/b/../c/./d")),
            PathBuf::from("/a/c/d")
        );
        assert_eq!(normalize_lexically(Path::new("/../x")), PathBuf::from("/x"));
        assert_eq!(normalize_lexically(Path::new("../x/y/..")), PathBuf::from("../x"));
    }

    #[test]
    fn test_ensure_within_accepts_children() {
        let base = Path::new("/repo/.repo-index/backups");
        assert_eq!(
            ensure_within(base, Path::new("nightly.db")).unwrap(),
            PathBuf::from("/repo/.repo-index/backups/nightly.db")
        );
        assert_eq!(
            ensure_within(base, Path::new("sub/../copy.db")).unwrap(),
            PathBuf::from("/repo/.repo-index/backups/copy.db")
        );
    }

    #[test]
    fn test_ensure_within_rejects_escapes() {
        let base = Path::new("/repo/.repo-index/backups");
        for candidate in ["../repository.db", "../../../etc/passwd", "/tmp/x.db", ".", "a/../.."] {
            let err = ensure_within(base, Path::new(candidate)).unwrap_err();
            assert!(matches!(err, IndexError::PathEscape { .. }), "{}", candidate);
        }
        // sibling directory sharing a name prefix
        assert!(ensure_within(base, Path::new("../backups-evil/x.db")).is_err());
    }

    #[test]
    fn test_relative_slash_path() {
        let root = Path::new("/repo");
        assert_eq!(
            relative_slash_path(root, Path::new("/repo/src/game/app.js")).as_deref(),
            Some("src/game/app.js")
        );
        assert_eq!(relative_slash_path(root, Path::new("/repo")), None);
        assert_eq!(relative_slash_path(root, Path::new("/elsewhere/a.js")), None);
    }
}

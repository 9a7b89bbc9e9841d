//! Configuration for a scanned root.
//!
//! Resolution order, highest first: command-line flags (which clap also fills
//! from `REPO_INDEX_DB` / `REPO_INDEX_DATA_DIR`), the project file
//! `.repo-index.toml` at the root, then compiled defaults. Repository
//! identity falls back to the `origin` remote and finally to fixed defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};
use crate::fs_utils;
use crate::git;

/// Project file looked up at the scanned root
pub const CONFIG_FILE_NAME: &str = ".repo-index.toml";
/// Directory holding the store, artifacts and backups
pub const STATE_DIR_NAME: &str = ".repo-index";
pub const DB_ENV: &str = "REPO_INDEX_DB";
pub const DATA_DIR_ENV: &str = "REPO_INDEX_DATA_DIR";

pub const DEFAULT_OWNER: &str = "local";
pub const DEFAULT_NAME: &str = "repository";

/// Contents of `.repo-index.toml`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProjectFile {
    #[serde(default)]
    pub storage: StorageSection,

    #[serde(default)]
    pub repository: RepositorySection,

    #[serde(default)]
    pub scan: ScanSection,
}

/// Storage locations; relative paths are resolved against the root
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StorageSection {
    #[serde(default)]
    pub db_path: Option<PathBuf>,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub backup_dir: Option<PathBuf>,
}

/// Explicit repository identity; missing fields are detected
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RepositorySection {
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ScanSection {
    /// Extra glob patterns excluded on top of the built-in set
    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default = "default_respect_gitignore")]
    pub respect_gitignore: bool,
}

fn default_respect_gitignore() -> bool {
    true
}

impl Default for ScanSection {
    fn default() -> Self {
        Self {
            exclude: Vec::new(),
            respect_gitignore: default_respect_gitignore(),
        }
    }
}

impl ProjectFile {
    /// Load `path`, or defaults when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| IndexError::Config {
            message: format!("Failed to parse {}: {}", path.display(), e),
        })
    }
}

/// Who the indexed repository belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoIdentity {
    pub owner: String,
    pub name: String,
    pub url: String,
}

impl RepoIdentity {
    /// Fixed identity used when nothing better is known
    pub fn fallback() -> Self {
        Self {
            owner: DEFAULT_OWNER.to_string(),
            name: DEFAULT_NAME.to_string(),
            url: String::new(),
        }
    }

    /// Identity from a remote URL, falling back when absent or unparseable
    pub fn from_remote_url(url: Option<&str>) -> Self {
        match url.and_then(git::parse_remote_url) {
            Some(remote) => Self {
                owner: remote.owner,
                name: remote.name,
                url: remote.url,
            },
            None => Self::fallback(),
        }
    }

    /// Identity of the git checkout containing `root`
    pub fn detect(root: &Path) -> Self {
        let url = git::origin_url(root);
        let identity = Self::from_remote_url(url.as_deref());
        tracing::debug!("repository identity {}/{}", identity.owner, identity.name);
        identity
    }

    /// Fill the gaps of an explicit section, calling `detect` only if needed
    fn merge(section: &RepositorySection, detect: impl FnOnce() -> Self) -> Self {
        match (&section.owner, &section.name) {
            (Some(owner), Some(name)) => Self {
                owner: owner.clone(),
                name: name.clone(),
                url: section.url.clone().unwrap_or_default(),
            },
            _ => {
                let detected = detect();
                Self {
                    owner: section.owner.clone().unwrap_or(detected.owner),
                    name: section.name.clone().unwrap_or(detected.name),
                    url: section.url.clone().unwrap_or(detected.url),
                }
            }
        }
    }
}

/// Values given on the command line (or through their environment variables)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub db_path: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
}

/// Fully resolved settings for one root
#[derive(Debug, Clone, PartialEq)]
pub struct IndexConfig {
    pub root: PathBuf,
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
    pub backup_dir: PathBuf,
    pub identity: RepoIdentity,
    pub exclude: Vec<String>,
    pub respect_gitignore: bool,
}

impl IndexConfig {
    /// Resolve configuration for `root`, detecting identity from git
    pub fn load(root: &Path, overrides: &ConfigOverrides) -> Result<Self> {
        Self::resolve(root, overrides, RepoIdentity::detect)
    }

    /// Resolve with an injected identity detector
    pub fn resolve(
        root: &Path,
        overrides: &ConfigOverrides,
        detect: impl FnOnce(&Path) -> RepoIdentity,
    ) -> Result<Self> {
        let root = root.canonicalize().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => IndexError::FileNotFound {
                path: root.display().to_string(),
            },
            _ => IndexError::Config {
                message: format!("Cannot use {} as root: {}", root.display(), e),
            },
        })?;
        let root = fs_utils::normalize_path(&root);
        if !root.is_dir() {
            return Err(IndexError::Config {
                message: format!("{} is not a directory", root.display()),
            });
        }

        let file = ProjectFile::load_from(&root.join(CONFIG_FILE_NAME))?;
        let state_dir = root.join(STATE_DIR_NAME);
        let in_root = |p: &PathBuf| if p.is_absolute() { p.clone() } else { root.join(p) };

        let db_path = overrides
            .db_path
            .clone()
            .or_else(|| file.storage.db_path.as_ref().map(in_root))
            .unwrap_or_else(|| state_dir.join("repository.db"));
        let data_dir = overrides
            .data_dir
            .clone()
            .or_else(|| file.storage.data_dir.as_ref().map(in_root))
            .unwrap_or_else(|| state_dir.join("data"));
        let backup_dir = file
            .storage
            .backup_dir
            .as_ref()
            .map(in_root)
            .unwrap_or_else(|| state_dir.join("backups"));

        let identity = RepoIdentity::merge(&file.repository, || detect(&root));

        Ok(Self {
            db_path,
            data_dir,
            backup_dir,
            identity,
            exclude: file.scan.exclude,
            respect_gitignore: file.scan.respect_gitignore,
            root,
        })
    }
}

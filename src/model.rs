//! Values shared by the analyzer, the scanner and storage
//!
//! Every enum here is persisted as its `as_str()` text and guarded by a CHECK
//! constraint in the storage schema, so the string forms must stay in sync
//! with `storage::schema`.

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};

/// Kind of scan recorded on a Scan row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScanKind {
    #[default]
    Full,
    Incremental,
    Partial,
}

impl ScanKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Incremental => "incremental",
            Self::Partial => "partial",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "full" => Ok(Self::Full),
            "incremental" => Ok(Self::Incremental),
            "partial" => Ok(Self::Partial),
            other => Err(IndexError::InvalidArgument {
                message: format!("unknown scan kind '{}'", other),
            }),
        }
    }
}

/// Scan lifecycle: running -> completed | failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Running,
    Completed,
    Failed,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// How a module was imported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    Default,
    Named,
    Namespace,
    Dynamic,
}

impl ImportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Named => "named",
            Self::Namespace => "namespace",
            Self::Dynamic => "dynamic",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "default" => Some(Self::Default),
            "named" => Some(Self::Named),
            "namespace" => Some(Self::Namespace),
            "dynamic" => Some(Self::Dynamic),
            _ => None,
        }
    }
}

/// How a symbol was exported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Default,
    Named,
    Namespace,
}

impl ExportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Named => "named",
            Self::Namespace => "namespace",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "default" => Some(Self::Default),
            "named" => Some(Self::Named),
            "namespace" => Some(Self::Namespace),
            _ => None,
        }
    }
}

/// Statement form that produced a dependency edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// ES module `import` / `export ... from`
    Import,
    /// CommonJS `require()`
    Require,
    /// `import()` expression
    Dynamic,
}

impl DependencyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Require => "require",
            Self::Dynamic => "dynamic",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "import" => Some(Self::Import),
            "require" => Some(Self::Require),
            "dynamic" => Some(Self::Dynamic),
            _ => None,
        }
    }
}

/// Fixed component taxonomy used to tag files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentCategory {
    Ui,
    Logic,
    Data,
    Infrastructure,
    Documentation,
    Test,
    Config,
}

impl ComponentCategory {
    pub const ALL: [ComponentCategory; 7] = [
        Self::Ui,
        Self::Logic,
        Self::Data,
        Self::Infrastructure,
        Self::Documentation,
        Self::Test,
        Self::Config,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ui => "ui",
            Self::Logic => "logic",
            Self::Data => "data",
            Self::Infrastructure => "infrastructure",
            Self::Documentation => "documentation",
            Self::Test => "test",
            Self::Config => "config",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Ui => "User interface markup, styles and view scripts",
            Self::Logic => "Application logic",
            Self::Data => "Data files and data-access code",
            Self::Infrastructure => "Build, deployment and automation",
            Self::Documentation => "Project documentation",
            Self::Test => "Automated tests",
            Self::Config => "Configuration files",
        }
    }
}

/// Per-file line classification; `code + comment + blank == total` always holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineCounts {
    pub total: usize,
    pub code: usize,
    pub comment: usize,
    pub blank: usize,
}

/// A function recovered by the analyzer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionData {
    pub name: String,
    pub signature: String,
    /// 1-indexed, inclusive
    pub start_line: usize,
    /// 1-indexed, inclusive
    pub end_line: usize,
    pub is_async: bool,
    pub is_exported: bool,
    pub is_arrow: bool,
    pub complexity: u32,
    pub purpose: String,
}

/// An import statement recovered by the analyzer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportData {
    pub source: String,
    pub items: Vec<String>,
    pub kind: ImportKind,
    pub line: usize,
    pub is_external: bool,
    /// Statement form, carried onto the dependency edge
    pub dependency_kind: DependencyKind,
}

/// An export recovered by the analyzer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportData {
    pub name: String,
    pub kind: ExportKind,
    pub line: usize,
    pub local_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_kind_parse() {
        assert_eq!(ScanKind::parse("full").unwrap(), ScanKind::Full);
        assert_eq!(ScanKind::parse("incremental").unwrap(), ScanKind::Incremental);
        assert!(ScanKind::parse("everything").is_err());
    }

    #[test]
    fn test_enum_strings_round_trip() {
        for kind in [ImportKind::Default, ImportKind::Named, ImportKind::Namespace, ImportKind::Dynamic] {
            assert_eq!(ImportKind::parse(kind.as_str()), Some(kind));
        }
        for kind in [DependencyKind::Import, DependencyKind::Require, DependencyKind::Dynamic] {
            assert_eq!(DependencyKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ScanStatus::parse("failed"), Some(ScanStatus::Failed));
        assert_eq!(ExportKind::parse("bogus"), None);
    }

    #[test]
    fn test_component_taxonomy_is_complete() {
        let names: Vec<&str> = ComponentCategory::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(
            names,
            vec!["ui", "logic", "data", "infrastructure", "documentation", "test", "config"]
        );
    }
}

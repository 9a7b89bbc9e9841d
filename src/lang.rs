//! File type detection and analyzer category dispatch

use std::path::Path;

use crate::error::{IndexError, Result};

/// Detected file types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lang {
    JavaScript,
    Jsx,
    TypeScript,
    Tsx,
    Html,
    Xml,
    Svg,
    /// Vue Single File Component (.vue)
    Vue,
    Css,
    Scss,
    Less,
    Markdown,
    /// Plain text and extensionless docs (LICENSE, README)
    Text,
    Json,
    Yaml,
    Toml,
    Ini,
    /// Dot-prefixed tool configuration (.gitignore, .editorconfig, .env)
    Dotfile,
}

impl Lang {
    /// Detect file type from a path, falling back to well-known file names
    pub fn from_path(path: &Path) -> Result<Self> {
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

        if let Some(lang) = Self::from_file_name(file_name) {
            return Ok(lang);
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| IndexError::Uncategorized {
                path: path.display().to_string(),
            })?;

        Self::from_extension(ext).ok_or_else(|| IndexError::Uncategorized {
            path: path.display().to_string(),
        })
    }

    /// Detect file type from file extension string
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "js" | "mjs" | "cjs" => Some(Self::JavaScript),
            "jsx" => Some(Self::Jsx),
            "ts" | "mts" | "cts" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            "html" | "htm" => Some(Self::Html),
            "xml" | "xsl" | "xslt" | "plist" => Some(Self::Xml),
            "svg" => Some(Self::Svg),
            "vue" => Some(Self::Vue),
            "css" => Some(Self::Css),
            "scss" | "sass" => Some(Self::Scss),
            "less" => Some(Self::Less),
            "md" | "markdown" => Some(Self::Markdown),
            "txt" | "rst" => Some(Self::Text),
            "json" | "webmanifest" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "toml" => Some(Self::Toml),
            "ini" | "cfg" | "conf" | "properties" => Some(Self::Ini),
            _ => None,
        }
    }

    fn from_file_name(file_name: &str) -> Option<Self> {
        match file_name {
            "LICENSE" | "LICENCE" | "README" | "CHANGELOG" | "AUTHORS" | "CONTRIBUTORS" => {
                Some(Self::Text)
            }
            ".gitignore" | ".gitattributes" | ".editorconfig" | ".npmrc" | ".nvmrc" | ".env"
            | ".prettierignore" | ".eslintignore" | ".nojekyll" => Some(Self::Dotfile),
            _ => None,
        }
    }

    /// Get the canonical type label stored on File and Language rows
    pub fn name(&self) -> &'static str {
        match self {
            Self::JavaScript => "javascript",
            Self::Jsx => "jsx",
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::Html => "html",
            Self::Xml => "xml",
            Self::Svg => "svg",
            Self::Vue => "vue",
            Self::Css => "css",
            Self::Scss => "scss",
            Self::Less => "less",
            Self::Markdown => "markdown",
            Self::Text => "text",
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Toml => "toml",
            Self::Ini => "ini",
            Self::Dotfile => "dotfile",
        }
    }

    /// Get the analyzer category for this file type
    pub fn category(&self) -> FileCategory {
        match self {
            Self::JavaScript | Self::Jsx | Self::TypeScript | Self::Tsx => FileCategory::Script,
            Self::Html | Self::Xml | Self::Svg | Self::Vue => FileCategory::Markup,
            Self::Css | Self::Scss | Self::Less => FileCategory::Stylesheet,
            Self::Markdown | Self::Text => FileCategory::Doc,
            Self::Json | Self::Yaml | Self::Toml | Self::Ini | Self::Dotfile => {
                FileCategory::Config
            }
        }
    }

    /// Extension used when probing import candidates (`./util` -> `./util.js`)
    pub fn default_extension(&self) -> &'static str {
        match self {
            Self::JavaScript => "js",
            Self::Jsx => "jsx",
            Self::TypeScript => "ts",
            Self::Tsx => "tsx",
            _ => "js",
        }
    }
}

/// Analyzer categories; each has its own comment-delimiter rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileCategory {
    /// JavaScript/TypeScript: functions, imports and exports are extracted
    Script,
    /// HTML, XML, SVG, Vue
    Markup,
    /// CSS, SCSS, Less
    Stylesheet,
    /// Markdown and plain text
    Doc,
    /// JSON, YAML, TOML, INI, dotfiles
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_type_detection() {
        assert_eq!(Lang::from_extension("js"), Some(Lang::JavaScript));
        assert_eq!(Lang::from_extension("MJS"), Some(Lang::JavaScript));
        assert_eq!(Lang::from_extension("tsx"), Some(Lang::Tsx));
        assert_eq!(Lang::from_extension("html"), Some(Lang::Html));
        assert_eq!(Lang::from_extension("scss"), Some(Lang::Scss));
        assert_eq!(Lang::from_extension("webmanifest"), Some(Lang::Json));
        assert_eq!(Lang::from_extension("yml"), Some(Lang::Yaml));
        assert_eq!(Lang::from_extension("png"), None);
    }

    #[test]
    fn test_type_from_path() {
        let path = PathBuf::from("src/game/riddles.js");
        assert_eq!(Lang::from_path(&path).unwrap(), Lang::JavaScript);

        let path = PathBuf::from("LICENSE");
        assert_eq!(Lang::from_path(&path).unwrap(), Lang::Text);

        let path = PathBuf::from(".gitignore");
        assert_eq!(Lang::from_path(&path).unwrap(), Lang::Dotfile);
    }

    #[test]
    fn test_uncategorized_path() {
        let err = Lang::from_path(&PathBuf::from("icons/icon-192.png")).unwrap_err();
        assert!(err.is_analysis_error());

        let err = Lang::from_path(&PathBuf::from("Makefile")).unwrap_err();
        assert!(err.is_analysis_error());
    }

    #[test]
    fn test_categories() {
        assert_eq!(Lang::TypeScript.category(), FileCategory::Script);
        assert_eq!(Lang::Svg.category(), FileCategory::Markup);
        assert_eq!(Lang::Less.category(), FileCategory::Stylesheet);
        assert_eq!(Lang::Markdown.category(), FileCategory::Doc);
        assert_eq!(Lang::Dotfile.category(), FileCategory::Config);
    }

    #[test]
    fn test_default_extension() {
        assert_eq!(Lang::JavaScript.default_extension(), "js");
        assert_eq!(Lang::TypeScript.default_extension(), "ts");
        assert_eq!(Lang::Html.default_extension(), "js");
    }
}

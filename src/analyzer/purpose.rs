//! Best-effort one-line purpose strings
//!
//! Functions: name-prefix conventions first, then the comment directly above
//! the declaration, then a generic label. Files: filename conventions, then
//! the file's opening comment or heading, then a label per category.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::lang::FileCategory;

/// Longest purpose taken from a comment
const MAX_COMMENT_PURPOSE_CHARS: usize = 120;
/// Lines above a declaration searched for a leading comment
const LEADING_COMMENT_LINES: usize = 3;
/// Lines at the top of a file searched for a heading comment
const HEAD_COMMENT_LINES: usize = 10;

/// Name prefix -> phrase template; `{}` receives the remainder as words
const PREFIX_TEMPLATES: [(&str, &str); 14] = [
    ("init", "Initializes {}"),
    ("get", "Gets {}"),
    ("set", "Sets {}"),
    ("create", "Creates {}"),
    ("delete", "Deletes {}"),
    ("update", "Updates {}"),
    ("load", "Loads {}"),
    ("save", "Saves {}"),
    ("validate", "Validates {}"),
    ("check", "Checks {}"),
    ("is", "Checks whether {}"),
    ("has", "Checks whether it has {}"),
    ("handle", "Handles {}"),
    ("on", "Handles the {} event"),
];

static HTML_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<title>\s*([^<]+?)\s*</title>").expect("valid regex"));

/// Purpose of the function `name` declared on 0-indexed line `decl`
pub fn function_purpose(name: &str, lines: &[&str], decl: usize) -> String {
    if let Some(phrase) = prefix_phrase(name) {
        return phrase;
    }
    if let Some(comment) = leading_comment(lines, decl) {
        return comment;
    }
    format!("Function {}", name)
}

fn prefix_phrase(name: &str) -> Option<String> {
    for (prefix, template) in PREFIX_TEMPLATES {
        let Some(rest) = name.strip_prefix(prefix) else {
            continue;
        };
        // `getRiddle` and `get_riddle` qualify, `settings` and `online` do not
        let rest = match rest.chars().next() {
            Some(c) if c.is_ascii_uppercase() => rest,
            Some('_') => rest.trim_start_matches('_'),
            _ => continue,
        };
        let words = split_words(rest);
        if words.is_empty() {
            continue;
        }
        return Some(template.replacen("{}", &words, 1));
    }
    None
}

/// `RiddleCount` / `riddle_count` -> `riddle count`
pub fn split_words(ident: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in ident.chars() {
        if c == '_' || c == '-' || c == '$' {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words.join(" ")
}

/// First meaningful text of the comment block ending right above `decl`
fn leading_comment(lines: &[&str], decl: usize) -> Option<String> {
    let mut collected: Vec<&str> = Vec::new();
    let mut idx = decl;
    while idx > 0 && collected.len() < LEADING_COMMENT_LINES {
        idx -= 1;
        let trimmed = lines.get(idx)?.trim();
        if !is_comment_line(trimmed) {
            break;
        }
        collected.push(trimmed);
    }
    collected.reverse();
    collected.into_iter().find_map(comment_text)
}

fn is_comment_line(trimmed: &str) -> bool {
    trimmed.starts_with("//")
        || trimmed.starts_with("/*")
        || trimmed.starts_with('*')
        || trimmed.starts_with("<!--")
        || trimmed.starts_with('#')
}

/// Strip comment markers; `None` for empty lines and JSDoc tags
fn comment_text(line: &str) -> Option<String> {
    let text = line
        .trim_start_matches("<!--")
        .trim_end_matches("-->")
        .trim_start_matches('/')
        .trim_start_matches('*')
        .trim_start_matches('#')
        .trim_end_matches("*/")
        .trim();
    if text.is_empty() || text.starts_with('@') || text.chars().all(|c| !c.is_alphanumeric()) {
        return None;
    }
    Some(text.chars().take(MAX_COMMENT_PURPOSE_CHARS).collect())
}

/// Purpose of the file at repository-relative `path`
pub fn file_purpose(path: &str, category: FileCategory, lines: &[&str]) -> String {
    if let Some(purpose) = conventional_purpose(path, category) {
        return purpose;
    }
    if let Some(purpose) = head_comment(category, lines) {
        return purpose;
    }
    match category {
        FileCategory::Script => "Script module",
        FileCategory::Markup => "Markup document",
        FileCategory::Stylesheet => "Stylesheet",
        FileCategory::Doc => "Documentation",
        FileCategory::Config => "Configuration file",
    }
    .to_string()
}

fn conventional_purpose(path: &str, category: FileCategory) -> Option<String> {
    let file_name = Path::new(path).file_name()?.to_str()?.to_lowercase();
    let stem = file_name.split('.').next().unwrap_or(&file_name).to_string();
    let lower_path = path.to_lowercase();

    let is_test = file_name.contains(".test.")
        || file_name.contains(".spec.")
        || lower_path.split('/').any(|seg| seg == "test" || seg == "tests" || seg == "__tests__");
    if is_test {
        return Some(format!("Tests for {}", split_words(&stem)));
    }

    let purpose = match (stem.as_str(), category) {
        ("index" | "main" | "app", FileCategory::Script) => "Application entry point".to_string(),
        ("index", FileCategory::Markup) => "Main HTML page".to_string(),
        ("sw" | "service-worker" | "serviceworker", FileCategory::Script) => {
            "Service worker for offline caching".to_string()
        }
        ("readme", _) => "Project overview documentation".to_string(),
        ("license" | "licence", _) => "License terms".to_string(),
        ("changelog", _) => "Release history".to_string(),
        ("contributing", _) => "Contribution guidelines".to_string(),
        ("package", FileCategory::Config) => "Package manifest and scripts".to_string(),
        ("manifest", FileCategory::Config) => "Web app manifest".to_string(),
        ("", FileCategory::Config) => format!("Tool configuration ({})", file_name),
        (s, FileCategory::Config) if s.contains("config") || s.ends_with("rc") => {
            format!("Configuration for {}", split_words(s))
        }
        (s, FileCategory::Script) if s.contains("util") || s.contains("helper") => {
            "Utility helpers".to_string()
        }
        (s, FileCategory::Stylesheet) => format!("Styles for {}", split_words(s)),
        _ => return None,
    };
    Some(purpose)
}

fn head_comment(category: FileCategory, lines: &[&str]) -> Option<String> {
    let head = lines.iter().take(HEAD_COMMENT_LINES).map(|l| l.trim());
    match category {
        FileCategory::Doc => head
            .filter(|l| l.starts_with('#'))
            .find_map(comment_text),
        FileCategory::Markup => lines
            .iter()
            .take(HEAD_COMMENT_LINES * 3)
            .find_map(|l| HTML_TITLE.captures(l))
            .map(|caps| caps[1].to_string())
            .or_else(|| {
                lines
                    .iter()
                    .take(HEAD_COMMENT_LINES)
                    .map(|l| l.trim())
                    .filter(|l| l.starts_with("<!--"))
                    .find_map(comment_text)
            }),
        _ => head
            .skip_while(|l| l.is_empty() || l.starts_with("#!") || l.starts_with("'use strict'") || l.starts_with("\"use strict\""))
            .take_while(|l| is_comment_line(l))
            .find_map(comment_text),
    }
}

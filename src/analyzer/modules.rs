//! Import and export statement extraction
//!
//! Line-oriented: every line is checked on its own, independently of function
//! discovery. A statement split over several lines is only recognized by its
//! first line, except `module.exports = { ... }`, whose entries are followed
//! until the closing brace.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{DependencyKind, ExportData, ExportKind, ImportData, ImportKind};

const IDENT: &str = r"[A-Za-z_$][\w$]*";

static ES_IMPORT_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*import\s+(.+?)\s+from\s+['"]([^'"]+)['"]"#).expect("valid regex")
});
static ES_IMPORT_BARE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\s*import\s+['"]([^'"]+)['"]"#).expect("valid regex"));
static DYNAMIC_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\bimport\s*\(\s*['"`]([^'"`]+)['"`]\s*\)"#).expect("valid regex")
});
static REQUIRE_DESTRUCTURED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\b(?:const|let|var)\s+\{([^}]*)\}\s*=\s*require\s*\(\s*['"]([^'"]+)['"]\s*\)"#)
        .expect("valid regex")
});
static REQUIRE_BARE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"\b(?:const|let|var)\s+({IDENT})\s*=\s*require\s*\(\s*['"]([^'"]+)['"]\s*\)"#
    ))
    .expect("valid regex")
});
static REQUIRE_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\brequire\s*\(\s*['"]([^'"]+)['"]\s*\)"#).expect("valid regex")
});
static REEXPORT_FROM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"^\s*export\s+(?:type\s+)?(\*(?:\s+as\s+{IDENT})?|\{{[^}}]*\}})\s*from\s+['"]([^'"]+)['"]"#
    ))
    .expect("valid regex")
});
static EXPORT_DEFAULT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^\s*export\s+default\s+(?:async\s+)?(?:(?:function\b\s*\*?|class\b)\s*)?({IDENT})?"
    ))
    .expect("valid regex")
});
static EXPORT_DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^\s*export\s+(?:declare\s+)?(?:async\s+)?(?:function\s*\*?|class|const|let|var|interface|type|enum)\s+({IDENT})"
    ))
    .expect("valid regex")
});
static EXPORT_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*export\s*\{([^}]*)\}\s*;?\s*$").expect("valid regex"));
static MODULE_EXPORTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*module\.exports\s*=\s*(.*)$").expect("valid regex"));
static PROPERTY_EXPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^\s*(?:module\.)?exports\.({IDENT})\s*=\s*(.*)$")).expect("valid regex")
});
static IDENT_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(&format!(r"^({IDENT})\s*;?\s*$")).expect("valid regex"));
static NAMED_EXPRESSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^(?:async\s+)?(?:function\b\s*\*?|class\b)\s*({IDENT})")).expect("valid regex")
});

/// Words that can follow `export default` without naming anything
const NOT_A_NAME: [&str; 4] = ["new", "function", "class", "async"];

/// A source is external unless it starts with a relative or absolute marker
pub fn is_external(source: &str) -> bool {
    !(source.starts_with("./")
        || source.starts_with("../")
        || source.starts_with('/')
        || source == "."
        || source == "..")
}

fn is_comment(trimmed: &str) -> bool {
    trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*')
}

fn import(
    source: &str,
    items: Vec<String>,
    kind: ImportKind,
    line: usize,
    dependency_kind: DependencyKind,
) -> ImportData {
    ImportData {
        source: source.to_string(),
        items,
        kind,
        line,
        is_external: is_external(source),
        dependency_kind,
    }
}

/// Every import-like statement, in line order
pub fn extract_imports(lines: &[&str]) -> Vec<ImportData> {
    let mut imports = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        if is_comment(line.trim_start()) {
            continue;
        }
        let line_no = idx + 1;

        if let Some(caps) = ES_IMPORT_FROM.captures(line) {
            let (kind, items) = parse_import_clause(&caps[1]);
            imports.push(import(&caps[2], items, kind, line_no, DependencyKind::Import));
        } else if let Some(caps) = ES_IMPORT_BARE.captures(line) {
            imports.push(import(&caps[1], Vec::new(), ImportKind::Named, line_no, DependencyKind::Import));
        } else if let Some(caps) = REEXPORT_FROM.captures(line) {
            let (kind, items) = parse_reexport_clause(&caps[1]);
            imports.push(import(&caps[2], items, kind, line_no, DependencyKind::Import));
        } else if let Some(caps) = REQUIRE_DESTRUCTURED.captures(line) {
            let items = split_list(&caps[1])
                .into_iter()
                .map(|(original, _)| original)
                .collect();
            imports.push(import(&caps[2], items, ImportKind::Named, line_no, DependencyKind::Require));
        } else if let Some(caps) = REQUIRE_BARE.captures(line) {
            imports.push(import(
                &caps[2],
                vec![caps[1].to_string()],
                ImportKind::Default,
                line_no,
                DependencyKind::Require,
            ));
        } else if let Some(caps) = REQUIRE_CALL.captures(line) {
            imports.push(import(&caps[1], Vec::new(), ImportKind::Default, line_no, DependencyKind::Require));
        }

        for caps in DYNAMIC_IMPORT.captures_iter(line) {
            let source = &caps[1];
            if source.contains("${") {
                continue;
            }
            imports.push(import(source, Vec::new(), ImportKind::Dynamic, line_no, DependencyKind::Dynamic));
        }
    }

    imports
}

/// `Def`, `{ a, b as c }`, `* as ns`, `Def, { a }`, `Def, * as ns`
fn parse_import_clause(clause: &str) -> (ImportKind, Vec<String>) {
    let clause = clause.trim();
    let clause = clause.strip_prefix("type ").unwrap_or(clause).trim();

    if let Some(pos) = clause.find("* as ") {
        let mut items = leading_default(&clause[..pos]);
        let ns = clause[pos + "* as ".len()..].trim();
        if !ns.is_empty() {
            items.push(ns.to_string());
        }
        return (ImportKind::Namespace, items);
    }

    if let Some(open) = clause.find('{') {
        let mut items = leading_default(&clause[..open]);
        let close = clause.rfind('}').unwrap_or(clause.len());
        let inner = if close > open { &clause[open + 1..close] } else { "" };
        items.extend(split_list(inner).into_iter().map(|(original, _)| original));
        return (ImportKind::Named, items);
    }

    (ImportKind::Default, vec![clause.to_string()])
}

fn leading_default(prefix: &str) -> Vec<String> {
    let name = prefix.trim().trim_end_matches(',').trim();
    if name.is_empty() {
        Vec::new()
    } else {
        vec![name.to_string()]
    }
}

fn parse_reexport_clause(clause: &str) -> (ImportKind, Vec<String>) {
    if let Some(rest) = clause.strip_prefix('*') {
        let items = rest
            .trim()
            .strip_prefix("as")
            .map(|ns| vec![ns.trim().to_string()])
            .unwrap_or_default();
        return (ImportKind::Namespace, items);
    }
    let inner = clause.trim_start_matches('{').trim_end_matches('}');
    let items = split_list(inner).into_iter().map(|(original, _)| original).collect();
    (ImportKind::Named, items)
}

/// `a, b as c, type D` -> [(a, a), (b, c), (D, D)]
fn split_list(inner: &str) -> Vec<(String, String)> {
    inner
        .split(',')
        .filter_map(|entry| {
            let entry = entry.trim();
            let entry = entry.strip_prefix("type ").unwrap_or(entry).trim();
            if entry.is_empty() {
                return None;
            }
            // CommonJS destructuring uses `a: b` for renames
            let (original, alias) = entry
                .split_once(" as ")
                .or_else(|| entry.split_once(':'))
                .map(|(a, b)| (a.trim(), b.trim()))
                .unwrap_or((entry, entry));
            Some((original.to_string(), alias.to_string()))
        })
        .collect()
}

/// Every export-like statement, in line order
pub fn extract_exports(lines: &[&str]) -> Vec<ExportData> {
    let mut exports = Vec::new();
    let mut in_module_object = false;

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;

        if in_module_object {
            let (body, closed) = match line.find('}') {
                Some(pos) => (&line[..pos], true),
                None => (*line, false),
            };
            exports.extend(object_entries(body, line_no));
            in_module_object = !closed;
            continue;
        }

        if is_comment(line.trim_start()) {
            continue;
        }

        if let Some(caps) = REEXPORT_FROM.captures(line) {
            exports.extend(reexports(&caps[1], line_no));
        } else if let Some(caps) = EXPORT_DEFAULT.captures(line) {
            let local = caps
                .get(1)
                .map(|m| m.as_str())
                .filter(|name| !NOT_A_NAME.contains(name))
                .map(str::to_string);
            exports.push(ExportData {
                name: "default".to_string(),
                kind: ExportKind::Default,
                line: line_no,
                local_name: local,
            });
        } else if let Some(caps) = EXPORT_DECLARATION.captures(line) {
            exports.push(ExportData {
                name: caps[1].to_string(),
                kind: ExportKind::Named,
                line: line_no,
                local_name: Some(caps[1].to_string()),
            });
        } else if let Some(caps) = EXPORT_LIST.captures(line) {
            for (local, exported) in split_list(&caps[1]) {
                let kind = if exported == "default" {
                    ExportKind::Default
                } else {
                    ExportKind::Named
                };
                exports.push(ExportData {
                    name: exported,
                    kind,
                    line: line_no,
                    local_name: Some(local),
                });
            }
        } else if let Some(caps) = MODULE_EXPORTS.captures(line) {
            let value = caps[1].trim();
            if let Some(object) = value.strip_prefix('{') {
                let (body, closed) = match object.find('}') {
                    Some(pos) => (&object[..pos], true),
                    None => (object, false),
                };
                exports.extend(object_entries(body, line_no));
                in_module_object = !closed;
            } else {
                exports.push(whole_module_export(value, line_no));
            }
        } else if let Some(caps) = PROPERTY_EXPORT.captures(line) {
            let local = IDENT_ONLY
                .captures(caps[2].trim())
                .map(|c| c[1].to_string())
                .filter(|name| !NOT_A_NAME.contains(&name.as_str()));
            exports.push(ExportData {
                name: caps[1].to_string(),
                kind: ExportKind::Named,
                line: line_no,
                local_name: local,
            });
        }
    }

    exports
}

fn reexports(clause: &str, line: usize) -> Vec<ExportData> {
    if let Some(rest) = clause.strip_prefix('*') {
        let name = rest
            .trim()
            .strip_prefix("as")
            .map(|ns| ns.trim().to_string())
            .unwrap_or_else(|| "*".to_string());
        return vec![ExportData {
            name,
            kind: ExportKind::Namespace,
            line,
            local_name: None,
        }];
    }
    let inner = clause.trim_start_matches('{').trim_end_matches('}');
    split_list(inner)
        .into_iter()
        .map(|(original, exported)| ExportData {
            kind: if exported == "default" {
                ExportKind::Default
            } else {
                ExportKind::Named
            },
            name: exported,
            line,
            local_name: Some(original),
        })
        .collect()
}

/// `module.exports = Game;` / `module.exports = function play() {` / anything else
fn whole_module_export(value: &str, line: usize) -> ExportData {
    let local = IDENT_ONLY
        .captures(value)
        .or_else(|| NAMED_EXPRESSION.captures(value))
        .map(|c| c[1].to_string())
        .filter(|name| !NOT_A_NAME.contains(&name.as_str()));
    ExportData {
        name: local.clone().unwrap_or_else(|| "default".to_string()),
        kind: ExportKind::Default,
        line,
        local_name: local,
    }
}

/// Entries of a `module.exports = { ... }` body: `a`, `b: c`, `d() {`
fn object_entries(body: &str, line: usize) -> Vec<ExportData> {
    static KEY: Lazy<Regex> = Lazy::new(|| {
        Regex::new(&format!(r#"^['"]?({IDENT})['"]?\s*(?::\s*(.*))?$"#)).expect("valid regex")
    });
    static METHOD: Lazy<Regex> =
        Lazy::new(|| Regex::new(&format!(r"^(?:async\s+)?({IDENT})\s*\(")).expect("valid regex"));

    body.split(',')
        .filter_map(|entry| {
            let entry = entry.trim();
            if entry.is_empty() || entry.starts_with("...") || entry.starts_with("//") {
                return None;
            }
            if let Some(caps) = METHOD.captures(entry) {
                return Some(ExportData {
                    name: caps[1].to_string(),
                    kind: ExportKind::Named,
                    line,
                    local_name: None,
                });
            }
            let caps = KEY.captures(entry)?;
            let name = caps[1].to_string();
            let local = match caps.get(2) {
                Some(value) => IDENT_ONLY
                    .captures(value.as_str().trim())
                    .map(|c| c[1].to_string()),
                None => Some(name.clone()),
            };
            Some(ExportData {
                name,
                kind: ExportKind::Named,
                line,
                local_name: local,
            })
        })
        .collect()
}

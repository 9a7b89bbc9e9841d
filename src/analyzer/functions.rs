//! Function discovery for script files
//!
//! Each line is tested against an ordered list of matchers and the first
//! match wins. Patterns are kept separate on purpose: merging them changes
//! which line shapes are recognized. After a hit the body end is found by
//! brace counting and scanning resumes on the line after it, so nested
//! functions are never reported.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{complexity, purpose};
use crate::model::FunctionData;

/// Lines after a function's declaration line searched for `module.exports` / `exports.x`
pub const EXPORT_LOOKAHEAD_LINES: usize = 10;

pub const MAX_SIGNATURE_CHARS: usize = 200;

/// Control-flow words that look like `name(...) {` but never name a function
const RESERVED: [&str; 7] = ["if", "for", "while", "switch", "catch", "with", "else"];

/// Line shape a matcher recognizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionShape {
    /// `function name(`
    Declaration,
    /// `const name = (...) =>`
    ParenArrow,
    /// `const name = arg =>`
    IdentArrow,
    /// `name(...) {`
    Method,
    /// `async function name(`
    AsyncDeclaration,
    /// `const name = async (...) =>`
    AsyncArrow,
}

impl FunctionShape {
    pub fn is_arrow(&self) -> bool {
        matches!(self, Self::ParenArrow | Self::IdentArrow | Self::AsyncArrow)
    }
}

struct Matcher {
    shape: FunctionShape,
    regex: Regex,
}

const IDENT: &str = r"[A-Za-z_$][\w$]*";

static MATCHERS: Lazy<Vec<Matcher>> = Lazy::new(|| {
    let patterns = [
        (
            FunctionShape::Declaration,
            format!(r"\bfunction\b\s*\*?\s*({IDENT})\s*\("),
        ),
        (
            FunctionShape::ParenArrow,
            format!(r"^\s*(?:export\s+)?(?:const|let|var)\s+({IDENT})\s*=\s*\([^)]*\)\s*=>"),
        ),
        (
            FunctionShape::IdentArrow,
            format!(r"^\s*(?:export\s+)?(?:const|let|var)\s+({IDENT})\s*=\s*(?:async\s+)?{IDENT}\s*=>"),
        ),
        (
            FunctionShape::Method,
            format!(r"^\s*(?:static\s+)?(?:async\s+)?({IDENT})\s*\([^)]*\)\s*\{{"),
        ),
        (
            FunctionShape::AsyncDeclaration,
            format!(r"\basync\s+function\b\s*\*?\s*({IDENT})\s*\("),
        ),
        (
            FunctionShape::AsyncArrow,
            format!(r"^\s*(?:export\s+)?(?:const|let|var)\s+({IDENT})\s*=\s*async\s*\([^)]*\)\s*=>"),
        ),
    ];
    patterns
        .into_iter()
        .map(|(shape, pattern)| Matcher {
            shape,
            regex: Regex::new(&pattern).expect("valid regex"),
        })
        .collect()
});

static ASYNC_KEYWORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\basync\b").expect("valid regex"));
static EXPORT_KEYWORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bexport\b").expect("valid regex"));
static MODULE_EXPORTS_OBJECT_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bmodule\.exports\s*=\s*\{").expect("valid regex"));
static EXPORTS_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bmodule\.exports\b|(?:^|[^\w$.])exports\.").expect("valid regex"));

/// A line recognized as the start of a function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionStart {
    pub name: String,
    pub shape: FunctionShape,
    pub is_async: bool,
}

/// Test `line` against the ordered matchers. The first matching pattern
/// decides; a reserved name rejects the line outright.
pub fn match_function_start(line: &str) -> Option<FunctionStart> {
    for matcher in MATCHERS.iter() {
        let Some(caps) = matcher.regex.captures(line) else {
            continue;
        };
        let name = caps.get(1)?;
        if RESERVED.contains(&name.as_str()) {
            return None;
        }
        let is_async = matches!(
            matcher.shape,
            FunctionShape::AsyncDeclaration | FunctionShape::AsyncArrow
        ) || ASYNC_KEYWORD.is_match(&line[..name.start()]);
        return Some(FunctionStart {
            name: name.as_str().to_string(),
            shape: matcher.shape,
            is_async,
        });
    }
    None
}

/// 0-indexed line on which the function starting at `start` ends.
///
/// Counts braces from the first `{` at or after `start`. An arrow whose
/// start line has no `{` is a single-line body. A declaration that hits `;`
/// before any `{` (overload signatures, `declare function`) ends there.
/// Unbalanced braces run to the last line.
pub fn find_function_end(lines: &[&str], start: usize, shape: FunctionShape) -> usize {
    let Some(first) = lines.get(start) else {
        return start;
    };
    if shape.is_arrow() && !first.contains('{') {
        return start;
    }

    let mut depth: usize = 0;
    let mut opened = false;
    for (idx, line) in lines.iter().enumerate().skip(start) {
        for ch in line.chars() {
            match ch {
                '{' => {
                    depth += 1;
                    opened = true;
                }
                '}' if opened => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return idx;
                    }
                }
                _ => {}
            }
        }
        if !opened && line.trim_end().ends_with(';') {
            return idx;
        }
    }

    if opened {
        lines.len() - 1
    } else {
        start
    }
}

/// Scan all lines and build a record for every function found
pub fn discover_functions(lines: &[&str]) -> Vec<FunctionData> {
    let mut functions = Vec::new();
    let mut idx = 0;

    while idx < lines.len() {
        let Some(start) = match_function_start(lines[idx]) else {
            idx += 1;
            continue;
        };
        let end = find_function_end(lines, idx, start.shape);

        functions.push(FunctionData {
            signature: signature(lines[idx]),
            start_line: idx + 1,
            end_line: end + 1,
            is_async: start.is_async,
            is_exported: is_exported(lines, idx, &start.name),
            is_arrow: start.shape.is_arrow(),
            complexity: complexity::complexity_of_range(lines, idx, end),
            purpose: purpose::function_purpose(&start.name, lines, idx),
            name: start.name,
        });

        idx = end + 1;
    }

    functions
}

/// Declaration line, trimmed, without the opening brace
fn signature(line: &str) -> String {
    let trimmed = line.trim();
    let trimmed = trimmed.strip_suffix('{').unwrap_or(trimmed).trim_end();
    trimmed.chars().take(MAX_SIGNATURE_CHARS).collect()
}

/// `export` on the declaration line, or a CommonJS export of `name` within
/// the [`EXPORT_LOOKAHEAD_LINES`] lines that follow the declaration line.
/// Body lines count toward the window, so long functions exported at the
/// bottom of a file are not detected.
fn is_exported(lines: &[&str], start: usize, name: &str) -> bool {
    if EXPORT_KEYWORD.is_match(lines[start]) {
        return true;
    }

    let from = start + 1;
    let to = (start + EXPORT_LOOKAHEAD_LINES).min(lines.len().saturating_sub(1));
    if from > to {
        return false;
    }

    let mut in_export_object = false;
    for line in &lines[from..=to] {
        if in_export_object {
            let body = line.split('}').next().unwrap_or(line);
            if contains_identifier(body, name) {
                return true;
            }
            if line.contains('}') {
                in_export_object = false;
            }
            continue;
        }

        let Some(found) = EXPORTS_REFERENCE.find(line) else {
            continue;
        };
        let tail = &line[found.start()..];
        if contains_identifier(tail, name) {
            return true;
        }
        if MODULE_EXPORTS_OBJECT_OPEN.is_match(line) && !line.contains('}') {
            in_export_object = true;
        }
    }
    false
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Whole-identifier occurrence of `ident` in `haystack`
pub(crate) fn contains_identifier(haystack: &str, ident: &str) -> bool {
    if ident.is_empty() {
        return false;
    }
    haystack.match_indices(ident).any(|(pos, _)| {
        let before = haystack[..pos].chars().next_back();
        let after = haystack[pos + ident.len()..].chars().next();
        !before.is_some_and(is_ident_char) && !after.is_some_and(is_ident_char)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discover(source: &str) -> Vec<FunctionData> {
        let lines: Vec<&str> = source.lines().collect();
        discover_functions(&lines)
    }

    #[test]
    fn test_single_line_declaration() {
        let functions = discover("function add(a,b){return a+b;}");
        assert_eq!(functions.len(), 1);
        let add = &functions[0];
        assert_eq!(add.name, "add");
        assert_eq!(add.start_line, 1);
        assert_eq!(add.end_line, 1);
        assert_eq!(add.complexity, 1);
        assert!(!add.is_exported);
        assert!(!add.is_async);
        assert!(!add.is_arrow);
        assert_eq!(add.signature, "function add(a,b){return a+b;}");
    }

    #[test]
    fn test_matcher_order_and_shapes() {
        let cases = [
            ("function load() {", "load", FunctionShape::Declaration),
            ("export function* gen() {", "gen", FunctionShape::Declaration),
            ("const sum = (a, b) => a + b;", "sum", FunctionShape::ParenArrow),
            ("export let twice = x => x * 2;", "twice", FunctionShape::IdentArrow),
            ("  render(state) {", "render", FunctionShape::Method),
            ("  static async create(opts) {", "create", FunctionShape::Method),
            ("const fetchAll = async () => {", "fetchAll", FunctionShape::AsyncArrow),
        ];
        for (line, name, shape) in cases {
            let start = match_function_start(line).unwrap_or_else(|| panic!("no match: {}", line));
            assert_eq!(start.name, name, "{}", line);
            assert_eq!(start.shape, shape, "{}", line);
        }
    }

    #[test]
    fn test_async_detection() {
        assert!(match_function_start("async function go() {").unwrap().is_async);
        assert!(match_function_start("  async init() {").unwrap().is_async);
        assert!(match_function_start("const f = async () => {").unwrap().is_async);
        assert!(!match_function_start("function asyncish() {").unwrap().is_async);
    }

    #[test]
    fn test_reserved_words_are_rejected() {
        for line in [
            "if (x) {",
            "  for (let i = 0; i < n; i++) {",
            "while (running) {",
            "switch (kind) {",
            "catch (err) {",
            "with (obj) {",
        ] {
            assert!(match_function_start(line).is_none(), "{}", line);
        }
        assert!(discover("if (x) {\n  y();\n}").is_empty());
    }

    #[test]
    fn test_multi_line_body_and_resume() {
        let source = "\
function outer(a) {
  function inner() {
    return 1;
  }
  if (a) {
    return inner();
  }
}
const after = () => 2;";
        let functions = discover(source);
        let names: Vec<&str> = functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["outer", "after"]);
        assert_eq!(functions[0].start_line, 1);
        assert_eq!(functions[0].end_line, 8);
        assert_eq!(functions[0].complexity, 2);
        assert_eq!(functions[1].start_line, 9);
        assert_eq!(functions[1].end_line, 9);
        assert!(functions[1].is_arrow);
    }

    #[test]
    fn test_unbalanced_body_runs_to_end() {
        let functions = discover("function broken() {\n  if (x) {\n    y();\n");
        assert_eq!(functions.len(), 1);
        assert_eq!(functions[0].end_line, 3);
    }

    #[test]
    fn test_declaration_without_body_ends_at_semicolon() {
        let functions = discover("function sig(a: number): void;\nfunction real() {\n}\n");
        let names: Vec<&str> = functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["sig", "real"]);
        assert_eq!(functions[0].end_line, 1);
        assert_eq!(functions[1].start_line, 2);
    }

    #[test]
    fn test_export_detection() {
        let source = "\
export function a() {}
function b() {}
function c() {}
function d() {}
module.exports = { b, renamed: c };
exports.d = d;";
        let functions = discover(source);
        let exported: Vec<(&str, bool)> = functions
            .iter()
            .map(|f| (f.name.as_str(), f.is_exported))
            .collect();
        assert_eq!(
            exported,
            vec![("a", true), ("b", true), ("c", true), ("d", true)]
        );
    }

    #[test]
    fn test_export_detection_multi_line_object() {
        let source = "\
function shuffle(list) {
  return list;
}
module.exports = {
  shuffle,
  other
};";
        assert!(discover(source)[0].is_exported);
    }

    #[test]
    fn test_export_lookahead_is_bounded() {
        let mut source = String::from("function far() {}\n");
        for _ in 0..EXPORT_LOOKAHEAD_LINES {
            source.push_str("let filler = 1;\n");
        }
        source.push_str("module.exports = { far };\n");
        assert!(!discover(&source)[0].is_exported);

        assert!(!discover("function near() {}\nmodule.exports = { nearby };")[0].is_exported);
    }

    #[test]
    fn test_export_lookahead_starts_at_declaration() {
        let mut long = String::from("function long() {\n");
        for _ in 0..EXPORT_LOOKAHEAD_LINES {
            long.push_str("  step();\n");
        }
        long.push_str("}\nmodule.exports = { long };\n");
        assert!(!discover(&long)[0].is_exported);

        let mut short = String::from("function short() {\n");
        for _ in 0..EXPORT_LOOKAHEAD_LINES - 3 {
            short.push_str("  step();\n");
        }
        short.push_str("}\nmodule.exports = { short };\n");
        assert!(discover(&short)[0].is_exported);
    }

    #[test]
    fn test_signature_is_trimmed_and_truncated() {
        assert_eq!(signature("  function go(a) {  "), "function go(a)");
        let long = format!("function long({}) {{", "x".repeat(300));
        assert_eq!(signature(&long).chars().count(), MAX_SIGNATURE_CHARS);
    }

    #[test]
    fn test_contains_identifier() {
        assert!(contains_identifier("{ a, b }", "b"));
        assert!(contains_identifier("exports.$get = $get", "$get"));
        assert!(!contains_identifier("{ abc }", "b"));
        assert!(!contains_identifier("x", ""));
    }
}

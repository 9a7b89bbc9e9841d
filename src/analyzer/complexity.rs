//! Textual cyclomatic complexity estimate
//!
//! Counts branch constructs by regex over raw text, so keywords inside strings
//! and comments are counted too. `?` also matches optional chaining and `??`.

use once_cell::sync::Lazy;
use regex::Regex;

/// `if` not preceded by `else`; the `else if` pattern counts those
static PLAIN_IF: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bif\b").expect("valid regex"));
static ELSE_IF: Lazy<Regex> = Lazy::new(|| Regex::new(r"\belse\s+if\b").expect("valid regex"));

static BRANCHES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"\bfor\b", r"\bwhile\b", r"\bcase\b", r"\bcatch\b", r"&&", r"\|\|", r"\?"]
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
});

/// 1 plus one per occurrence of `if`, `else if`, `for`, `while`, `case`,
/// `catch`, `&&`, `||` and `?`. An `else if` counts once, not twice.
pub fn cyclomatic_complexity(text: &str) -> u32 {
    let else_ifs = ELSE_IF.find_iter(text).count();
    let plain_ifs = PLAIN_IF.find_iter(text).count().saturating_sub(else_ifs);
    let branches: usize = BRANCHES.iter().map(|re| re.find_iter(text).count()).sum();

    1 + (plain_ifs + else_ifs + branches) as u32
}

/// Complexity of an inclusive, 0-indexed line range
pub fn complexity_of_range(lines: &[&str], start: usize, end: usize) -> u32 {
    if start >= lines.len() {
        return 1;
    }
    let end = end.min(lines.len() - 1);
    cyclomatic_complexity(&lines[start..=end].join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_straight_line_code_is_one() {
        assert_eq!(cyclomatic_complexity("function add(a,b){return a+b;}"), 1);
        assert_eq!(cyclomatic_complexity(""), 1);
    }

    #[test]
    fn test_each_construct_adds_one() {
        let cases = [
            "if (a) {}",
            "} else if (b) {",
            "for (;;) {}",
            "while (x) {}",
            "case 1:",
            "} catch (e) {",
            "a && b",
            "a || b",
            "a ? b : c",
        ];
        for case in cases {
            assert_eq!(cyclomatic_complexity(case), 2, "{}", case);
        }
    }

    #[test]
    fn test_monotonic_in_added_constructs() {
        let base = "function f(x) {\n  let y = x;\n  return y;\n}";
        let with_ifs = "function f(x) {\n  let y = x;\n  if (y) y++;\n  if (x && y) y--;\n  return y;\n}";
        assert_eq!(cyclomatic_complexity(with_ifs), cyclomatic_complexity(base) + 3);
    }

    #[test]
    fn test_word_boundaries() {
        // `notify`, `format`, `whilst` and `cases` contain keywords but are not keywords
        assert_eq!(cyclomatic_complexity("notify(format, whilst, cases)"), 1);
    }

    #[test]
    fn test_range_is_clamped() {
        let lines = vec!["if (a) {", "  b();", "}"];
        assert_eq!(complexity_of_range(&lines, 0, 10), 2);
        assert_eq!(complexity_of_range(&lines, 1, 2), 1);
        assert_eq!(complexity_of_range(&lines, 5, 6), 1);
    }
}

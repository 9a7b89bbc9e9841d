//! Line classification into code, comment and blank
//!
//! Deliberately coarse: a line is classified by how it *starts* after
//! trimming, so `code(); // note` is code and `// note` followed by code on
//! the same line is comment. Markers inside string literals are not
//! recognized.

use crate::lang::FileCategory;
use crate::model::LineCounts;

/// Comment delimiters for one file category
#[derive(Debug, Clone, Copy)]
struct CommentSyntax {
    line: Option<&'static str>,
    block: Option<(&'static str, &'static str)>,
}

impl CommentSyntax {
    fn for_category(category: FileCategory) -> Self {
        match category {
            FileCategory::Script => Self {
                line: Some("//"),
                block: Some(("/*", "*/")),
            },
            FileCategory::Stylesheet => Self {
                line: None,
                block: Some(("/*", "*/")),
            },
            FileCategory::Markup | FileCategory::Doc => Self {
                line: None,
                block: Some(("<!--", "-->")),
            },
            FileCategory::Config => Self {
                line: Some("#"),
                block: None,
            },
        }
    }
}

/// Classify every line. The block-comment flag is checked first, so blank
/// lines inside an open block comment count as comment.
pub fn count_lines(category: FileCategory, lines: &[&str]) -> LineCounts {
    let syntax = CommentSyntax::for_category(category);
    let mut counts = LineCounts {
        total: lines.len(),
        ..LineCounts::default()
    };
    let mut in_block = false;

    for line in lines {
        let trimmed = line.trim();

        if in_block {
            counts.comment += 1;
            if let Some((_, close)) = syntax.block {
                if trimmed.contains(close) {
                    in_block = false;
                }
            }
            continue;
        }

        if trimmed.is_empty() {
            counts.blank += 1;
            continue;
        }

        if let Some(marker) = syntax.line {
            if trimmed.starts_with(marker) {
                counts.comment += 1;
                continue;
            }
        }

        if let Some((open, close)) = syntax.block {
            if let Some(rest) = trimmed.strip_prefix(open) {
                counts.comment += 1;
                if !rest.contains(close) {
                    in_block = true;
                }
                continue;
            }
        }

        counts.code += 1;
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(source: &str) -> LineCounts {
        let lines: Vec<&str> = source.lines().collect();
        count_lines(FileCategory::Script, &lines)
    }

    fn assert_balanced(counts: LineCounts) {
        assert_eq!(counts.code + counts.comment + counts.blank, counts.total);
    }

    #[test]
    fn test_single_line_function() {
        let counts = script("function add(a,b){return a+b;}");
        assert_eq!(counts.total, 1);
        assert_eq!(counts.code, 1);
        assert_balanced(counts);
    }

    #[test]
    fn test_mixed_script() {
        let source = "// header\n\nconst a = 1;\n/* one-line block */\n/**\n * docs\n\n */\nfunction f() {}\n";
        let counts = script(source);
        assert_eq!(counts.total, 9);
        assert_eq!(counts.blank, 1);
        assert_eq!(counts.comment, 6);
        assert_eq!(counts.code, 2);
        assert_balanced(counts);
    }

    #[test]
    fn test_trailing_comment_is_code() {
        let counts = script("let x = 1; // one");
        assert_eq!(counts.code, 1);
        assert_eq!(counts.comment, 0);
    }

    #[test]
    fn test_code_after_block_close_is_comment() {
        let counts = script("/* start\nend */ let y = 2;\nlet z = 3;");
        assert_eq!(counts.comment, 2);
        assert_eq!(counts.code, 1);
        assert_balanced(counts);
    }

    #[test]
    fn test_pathological_inputs_stay_balanced() {
        let empty = script("");
        assert_eq!(empty, LineCounts::default());

        let blanks = script("\n\n   \n\t\n");
        assert_eq!(blanks.total, 4);
        assert_eq!(blanks.blank, 4);
        assert_balanced(blanks);

        let unterminated = script("/* never closed\nstill comment\n\nfunction hidden() {}\n");
        assert_eq!(unterminated.total, 4);
        assert_eq!(unterminated.comment, 4);
        assert_balanced(unterminated);

        for source in ["*/", "/*/", "/**/ code", "//", "\r\n\r\n", "a\n/*\n*/\nb"] {
            assert_balanced(script(source));
        }
    }

    #[test]
    fn test_other_categories() {
        let html: Vec<&str> = "<!-- nav -->\n<nav>\n<!--\n  old\n-->\n\n</nav>".lines().collect();
        let counts = count_lines(FileCategory::Markup, &html);
        assert_eq!(counts.comment, 4);
        assert_eq!(counts.code, 2);
        assert_eq!(counts.blank, 1);

        let css: Vec<&str> = "/* theme */\nbody { color: red; }\n// not a comment".lines().collect();
        let counts = count_lines(FileCategory::Stylesheet, &css);
        assert_eq!(counts.comment, 1);
        assert_eq!(counts.code, 2);

        let yaml: Vec<&str> = "# settings\nname: riddles\n\n".lines().collect();
        let counts = count_lines(FileCategory::Config, &yaml);
        assert_eq!(counts.total, 3);
        assert_eq!(counts.comment, 1);
        assert_eq!(counts.code, 1);
        assert_eq!(counts.blank, 1);
    }
}

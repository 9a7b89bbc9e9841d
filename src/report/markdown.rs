//! ARCHITECTURE.md rendering

use super::{Snapshot, HIGH_COMPLEXITY, TOP_N, VERY_HIGH_COMPLEXITY};

/// Human-readable summary of the indexed repository
pub fn architecture(snapshot: &Snapshot) -> String {
    let repo = &snapshot.repository;
    let files = &snapshot.metrics.files;
    let functions = &snapshot.metrics.functions;
    let deps = &snapshot.metrics.dependencies;

    let mut md = String::new();
    md.push_str(&format!("# Architecture: {}/{}\n\n", repo.owner, repo.name));
    md.push_str(&format!("*Generated {}*\n\n", snapshot.generated_at));
    if !repo.url.is_empty() {
        md.push_str(&format!("Repository: {}\n\n", repo.url));
    }

    md.push_str("## Overview\n\n");
    md.push_str("| Metric | Value |\n|---|---|\n");
    md.push_str(&format!("| Files | {} |\n", files.total_files));
    md.push_str(&format!(
        "| Lines | {} ({} code, {} comment, {} blank) |\n",
        files.total_lines, files.code_lines, files.comment_lines, files.blank_lines
    ));
    md.push_str(&format!(
        "| Functions | {} ({} exported, {} async) |\n",
        functions.total_functions, functions.exported_functions, functions.async_functions
    ));
    md.push_str(&format!(
        "| Dependencies | {} ({} resolved, {} unresolved) |\n",
        deps.total, deps.resolved, deps.unresolved
    ));
    md.push_str(&format!("| External imports | {} |\n\n", deps.external_imports));

    if !snapshot.metrics.languages.is_empty() {
        md.push_str("## Languages\n\n");
        md.push_str("| Language | Files | Lines | Share |\n|---|---|---|---|\n");
        for lang in &snapshot.metrics.languages {
            md.push_str(&format!(
                "| {} | {} | {} | {:.2}% |\n",
                lang.name, lang.file_count, lang.total_lines, lang.percentage
            ));
        }
        md.push('\n');
    }

    let components: Vec<_> = snapshot
        .metrics
        .components
        .iter()
        .filter(|c| c.file_count > 0)
        .collect();
    if !components.is_empty() {
        md.push_str("## Components\n\n");
        for component in components {
            md.push_str(&format!(
                "- **{}** ({} files, {} lines): {}\n",
                component.name, component.file_count, component.total_lines, component.description
            ));
        }
        md.push('\n');
    }

    md.push_str(&format!("## Most Complex Files (top {})\n\n", TOP_N));
    let ranked: Vec<_> = snapshot
        .most_complex
        .iter()
        .filter(|e| e.complexity_score > 0)
        .collect();
    if ranked.is_empty() {
        md.push_str("No functions were found.\n\n");
    } else {
        md.push_str("| # | File | Complexity | Functions | Avg |\n|---|---|---|---|---|\n");
        for (i, entry) in ranked.iter().enumerate() {
            md.push_str(&format!(
                "| {} | `{}` | {} | {} | {:.1} |\n",
                i + 1,
                escape_cell(&entry.path),
                entry.complexity_score,
                entry.function_count,
                entry.avg_function_complexity
            ));
        }
        md.push('\n');
    }

    let connected = snapshot.most_connected(5);
    if !connected.is_empty() {
        md.push_str("## Most Connected Files\n\n");
        for (path, degree) in connected {
            md.push_str(&format!("- `{}`: {} edges\n", escape_cell(&path), degree));
        }
        md.push('\n');
    }

    let (high, very_high) = snapshot.debt_counts();
    md.push_str("## Technical Debt\n\n");
    md.push_str(&format!(
        "- Files with complexity above {}: {}\n",
        HIGH_COMPLEXITY, high
    ));
    md.push_str(&format!(
        "- Files with complexity above {}: {}\n",
        VERY_HIGH_COMPLEXITY, very_high
    ));
    if very_high > 0 {
        md.push_str("\nFiles above the upper threshold are candidates for splitting.\n");
    } else if high == 0 {
        md.push_str("\nNo file crosses the complexity thresholds.\n");
    }

    md
}

/// Keep table cells on one line and free of column separators
fn escape_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::seeded;

    #[test]
    fn test_architecture_sections() {
        let (db, repo) = seeded();
        let snapshot = Snapshot::collect(&db, &repo).unwrap();
        let md = architecture(&snapshot);

        assert!(md.starts_with("# Architecture: octo/riddles\n"));
        assert!(md.contains("| Files | 4 |"));
        assert!(md.contains("| 1 | `js/game.js` | 55 | 1 | 55.0 |"));
        assert!(md.contains("- Files with complexity above 20: 2"));
        assert!(md.contains("- Files with complexity above 50: 1"));
        assert!(md.contains("candidates for splitting"));
        assert!(md.contains("- `js/util.js`: 2 edges"));
    }

    #[test]
    fn test_escape_cell() {
        assert_eq!(escape_cell("a|b\nc"), "a\\|b c");
    }
}

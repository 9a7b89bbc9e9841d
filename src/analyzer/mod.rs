//! Heuristic source analysis
//!
//! A pure function of file content: no I/O and no persistence. Script files
//! get line counts, functions, imports and exports; every other category
//! gets line counts and a purpose string only.
//!
//! Known failure modes, all inherited from working on raw text: braces,
//! keywords and comment markers inside string literals are counted as code
//! structure, and statements spanning lines are mostly seen by their first
//! line.

pub mod complexity;
pub mod functions;
pub mod lines;
pub mod modules;
pub mod purpose;

use crate::lang::{FileCategory, Lang};
use crate::model::{ExportData, FunctionData, ImportData, LineCounts};

/// Structural summary of one file
#[derive(Debug, Clone, PartialEq)]
pub struct FileAnalysis {
    pub lang: Lang,
    pub lines: LineCounts,
    pub purpose: String,
    pub functions: Vec<FunctionData>,
    pub imports: Vec<ImportData>,
    pub exports: Vec<ExportData>,
    /// Sum of the functions' complexities; 0 for files without functions
    pub complexity: u32,
}

/// Analyze `content` of the file at repository-relative `path`
pub fn analyze(lang: Lang, path: &str, content: &str) -> FileAnalysis {
    let lines: Vec<&str> = content.lines().collect();
    let category = lang.category();

    let line_counts = lines::count_lines(category, &lines);
    let purpose = purpose::file_purpose(path, category, &lines);

    if category != FileCategory::Script {
        return FileAnalysis {
            lang,
            lines: line_counts,
            purpose,
            functions: Vec::new(),
            imports: Vec::new(),
            exports: Vec::new(),
            complexity: 0,
        };
    }

    let functions = functions::discover_functions(&lines);
    let complexity = functions.iter().map(|f| f.complexity).sum();

    FileAnalysis {
        lang,
        lines: line_counts,
        purpose,
        imports: modules::extract_imports(&lines),
        exports: modules::extract_exports(&lines),
        functions,
        complexity,
    }
}

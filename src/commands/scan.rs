//! Scan command handler - Build or refresh the index

use serde::Serialize;

use crate::cli::ScanArgs;
use crate::commands::{to_json, CommandContext};
use crate::error::Result;
use crate::report;
use crate::scanner::{LanguageShare, ScanOptions, Scanner};
use crate::storage::Database;

#[derive(Debug, Serialize)]
struct ScanReport<'a> {
    scan_id: i64,
    repository: String,
    root: String,
    database: String,
    files: usize,
    lines: usize,
    functions: usize,
    errors: usize,
    unchanged: usize,
    pruned: usize,
    languages: &'a [LanguageShare],
    most_complex: Option<RankedFile<'a>>,
    least_complex: Option<RankedFile<'a>>,
    artifacts: Vec<String>,
}

/// File with its summed function complexity
#[derive(Debug, Serialize)]
struct RankedFile<'a> {
    path: &'a str,
    complexity: u32,
}

fn ranked(extreme: &Option<(String, u32)>) -> Option<RankedFile<'_>> {
    extreme.as_ref().map(|(path, complexity)| RankedFile {
        path: path.as_str(),
        complexity: *complexity,
    })
}

/// Run the scan command
pub fn run_scan(args: &ScanArgs, ctx: &CommandContext) -> Result<String> {
    let config = match &args.path {
        Some(path) => ctx.config_for(path)?,
        None => ctx.config()?,
    };
    let db = Database::open(&config.db_path)?;

    let options = ScanOptions {
        kind: args.kind.into(),
        prune: args.prune,
    };
    let summary = Scanner::new(&db, &config).scan(options)?;

    let artifacts = if args.no_artifacts {
        Vec::new()
    } else {
        report::write_artifacts(&db, &summary.repository, &config.data_dir)?
            .into_iter()
            .map(|p| p.display().to_string())
            .collect()
    };

    let totals = summary.totals;
    let scan_report = ScanReport {
        scan_id: summary.scan_id,
        repository: format!("{}/{}", summary.repository.owner, summary.repository.name),
        root: config.root.display().to_string(),
        database: config.db_path.display().to_string(),
        files: totals.files_scanned,
        lines: totals.lines_scanned,
        functions: totals.functions_found,
        errors: totals.error_count,
        unchanged: summary.unchanged,
        pruned: summary.pruned,
        languages: &summary.languages,
        most_complex: ranked(&summary.most_complex),
        least_complex: ranked(&summary.least_complex),
        artifacts,
    };

    if ctx.is_json() {
        return to_json(&scan_report);
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Scan {} of {} complete\n",
        scan_report.scan_id, scan_report.repository
    ));
    out.push_str(&format!("  Files:     {}\n", scan_report.files));
    out.push_str(&format!("  Lines:     {}\n", scan_report.lines));
    out.push_str(&format!("  Functions: {}\n", scan_report.functions));
    out.push_str(&format!("  Errors:    {}\n", scan_report.errors));
    if scan_report.unchanged > 0 {
        out.push_str(&format!("  Unchanged: {}\n", scan_report.unchanged));
    }
    if args.prune {
        out.push_str(&format!("  Pruned:    {}\n", scan_report.pruned));
    }
    if let Some(file) = &scan_report.most_complex {
        out.push_str(&format!("  Most complex:  {} ({})\n", file.path, file.complexity));
    }
    if let Some(file) = &scan_report.least_complex {
        out.push_str(&format!("  Least complex: {} ({})\n", file.path, file.complexity));
    }
    if ctx.verbose {
        for share in scan_report.languages {
            out.push_str(&format!(
                "    {:<12} {:>5} files {:>8} lines {:>6.2}%\n",
                share.name, share.file_count, share.total_lines, share.percentage
            ));
        }
    }
    out.push_str(&format!("  Database:  {}\n", scan_report.database));
    for artifact in &scan_report.artifacts {
        out.push_str(&format!("  Wrote {}\n", artifact));
    }
    Ok(out)
}

//! Stats command handler - Repository totals

use serde::Serialize;

use crate::commands::{to_json, CommandContext};
use crate::error::Result;
use crate::storage::{Repository, RepositoryMetrics, ScanRecord};

#[derive(Debug, Serialize)]
struct StatsOutput<'a> {
    repository: &'a Repository,
    metrics: &'a RepositoryMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_scan: Option<&'a ScanRecord>,
}

/// Run the stats command
pub fn run_stats(ctx: &CommandContext) -> Result<String> {
    let config = ctx.config()?;
    let (db, repo) = ctx.open_existing(&config)?;
    let metrics = db.repository_metrics(repo.id)?;
    let scans = db.scans(repo.id)?;
    let last_scan = if ctx.verbose { scans.first() } else { None };

    if ctx.is_json() {
        return to_json(&StatsOutput {
            repository: &repo,
            metrics: &metrics,
            last_scan,
        });
    }

    let files = &metrics.files;
    let functions = &metrics.functions;
    let mut out = String::new();
    out.push_str(&format!("Repository: {}/{}\n", repo.owner, repo.name));
    if !repo.url.is_empty() {
        out.push_str(&format!("URL:        {}\n", repo.url));
    }
    if let Some(version) = &repo.version {
        out.push_str(&format!("Version:    {}\n", version));
    }
    out.push_str(&format!(
        "Last scan:  {}\n",
        repo.last_scan_at.as_deref().unwrap_or("never completed")
    ));
    out.push_str(&format!("Scans:      {}\n\n", scans.len()));

    out.push_str(&format!("Files:      {}\n", files.total_files));
    out.push_str(&format!(
        "Lines:      {} (code {}, comment {}, blank {})\n",
        files.total_lines, files.code_lines, files.comment_lines, files.blank_lines
    ));
    out.push_str(&format!("Size:       {} bytes\n", files.total_size_bytes));
    out.push_str(&format!("Avg file complexity: {:.2}\n\n", files.avg_complexity));

    out.push_str(&format!(
        "Functions:  {} ({} exported, {} async, {} arrow)\n",
        functions.total_functions,
        functions.exported_functions,
        functions.async_functions,
        functions.arrow_functions
    ));
    out.push_str(&format!(
        "Avg function complexity: {:.2} (max {})\n",
        functions.avg_complexity, functions.max_complexity
    ));
    out.push_str(&format!(
        "Dependencies: {} ({} resolved, {} unresolved, {} external imports)\n",
        metrics.dependencies.total,
        metrics.dependencies.resolved,
        metrics.dependencies.unresolved,
        metrics.dependencies.external_imports
    ));

    if ctx.verbose {
        out.push_str("\nLanguages:\n");
        out.push_str(&format!("  {:<12} {:>6} {:>9} {:>8}\n", "NAME", "FILES", "LINES", "SHARE"));
        for lang in &metrics.languages {
            out.push_str(&format!(
                "  {:<12} {:>6} {:>9} {:>7.2}%\n",
                lang.name, lang.file_count, lang.total_lines, lang.percentage
            ));
        }
        if let Some(scan) = last_scan {
            out.push_str(&format!(
                "\nLatest scan #{} ({}, {}): started {}, {} files, {} errors\n",
                scan.id, scan.kind, scan.status, scan.started_at, scan.files_scanned, scan.error_count
            ));
            if let Some(message) = &scan.error_message {
                out.push_str(&format!("  Failure: {}\n", message));
            }
        }
    }

    Ok(out)
}

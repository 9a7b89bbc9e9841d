//! Query command handlers - Read-only listings over the index

use crate::cli::{FilesArgs, FunctionsArgs, LimitArgs, SearchArgs};
use crate::commands::{parse_limit, to_json, truncate, CommandContext};
use crate::error::{IndexError, Result};
use crate::storage::FileSort;

/// Marker printed for dependency edges without a target file
pub const UNRESOLVED: &str = "(unresolved)";

/// Run the files command
pub fn run_files(args: &FilesArgs, ctx: &CommandContext) -> Result<String> {
    let limit = parse_limit(args.limit)?;
    let sort = FileSort::parse(&args.sort).ok_or_else(|| IndexError::InvalidArgument {
        message: format!(
            "unknown sort field '{}' (expected one of: {})",
            args.sort,
            FileSort::NAMES.join(", ")
        ),
    })?;

    let config = ctx.config()?;
    let (db, repo) = ctx.open_existing(&config)?;
    let files = db.list_files(repo.id, sort, limit)?;

    if ctx.is_json() {
        return to_json(&files);
    }

    let mut out = format!(
        "{:<50} {:<11} {:>7} {:>9} {:>5} {:>5}\n",
        "PATH", "TYPE", "LINES", "BYTES", "FUNCS", "CPLX"
    );
    for f in &files {
        out.push_str(&format!(
            "{:<50} {:<11} {:>7} {:>9} {:>5} {:>5}\n",
            truncate(&f.path, 50),
            f.file_type,
            f.lines_count,
            f.size_bytes,
            f.function_count,
            f.complexity_score
        ));
    }
    out.push_str(&format!("\n{} files\n", files.len()));
    Ok(out)
}

/// Run the functions command
pub fn run_functions(args: &FunctionsArgs, ctx: &CommandContext) -> Result<String> {
    let limit = parse_limit(args.limit)?;
    let config = ctx.config()?;
    let (db, repo) = ctx.open_existing(&config)?;
    let functions = db.list_functions(repo.id, args.file.as_deref(), limit)?;

    if ctx.is_json() {
        return to_json(&functions);
    }

    let mut out = format!(
        "{:<30} {:<40} {:>9} {:>5} {}\n",
        "NAME", "FILE", "LINES", "CPLX", "FLAGS"
    );
    for f in &functions {
        let mut flags = Vec::new();
        if f.is_exported {
            flags.push("exported");
        }
        if f.is_async {
            flags.push("async");
        }
        if f.is_arrow {
            flags.push("arrow");
        }
        out.push_str(&format!(
            "{:<30} {:<40} {:>9} {:>5} {}\n",
            truncate(&f.name, 30),
            truncate(&f.file_path, 40),
            format!("{}-{}", f.start_line, f.end_line),
            f.complexity,
            flags.join(",")
        ));
    }
    out.push_str(&format!("\n{} functions\n", functions.len()));
    Ok(out)
}

/// Run the search command
pub fn run_search(args: &SearchArgs, ctx: &CommandContext) -> Result<String> {
    let limit = parse_limit(args.limit)?;
    let config = ctx.config()?;
    let (db, repo) = ctx.open_existing(&config)?;
    let results = db.full_text_search(repo.id, &args.term, limit)?;

    if ctx.is_json() {
        return to_json(&results);
    }
    if results.is_empty() {
        return Ok(format!("No matches for '{}'\n", args.term));
    }

    let mut out = String::new();
    out.push_str(&format!("Files ({}):\n", results.files.len()));
    for hit in &results.files {
        out.push_str(&format!("  {}", hit.path));
        if !hit.purpose.is_empty() {
            out.push_str(&format!(" - {}", truncate(&hit.purpose, 60)));
        }
        out.push('\n');
    }
    out.push_str(&format!("\nFunctions ({}):\n", results.functions.len()));
    for hit in &results.functions {
        out.push_str(&format!(
            "  {}:{} {}\n",
            hit.file_path,
            hit.start_line,
            truncate(&hit.signature, 80)
        ));
    }
    Ok(out)
}

/// Run the deps command
pub fn run_deps(args: &LimitArgs, ctx: &CommandContext) -> Result<String> {
    let limit = parse_limit(args.limit)?;
    let config = ctx.config()?;
    let (db, repo) = ctx.open_existing(&config)?;
    let mut edges = db.dependency_graph(repo.id)?;
    if let Some(limit) = limit {
        edges.truncate(limit);
    }

    if ctx.is_json() {
        return to_json(&edges);
    }

    let mut out = String::new();
    for edge in &edges {
        out.push_str(&format!(
            "{} -> {} [{}] '{}'\n",
            edge.from_path,
            edge.to_path.as_deref().unwrap_or(UNRESOLVED),
            edge.kind,
            edge.import_path
        ));
    }
    let resolved = edges.iter().filter(|e| e.is_resolved).count();
    out.push_str(&format!(
        "\n{} edges ({} resolved, {} unresolved)\n",
        edges.len(),
        resolved,
        edges.len() - resolved
    ));
    Ok(out)
}

/// Run the complexity command
pub fn run_complexity(args: &LimitArgs, ctx: &CommandContext) -> Result<String> {
    let limit = parse_limit(args.limit)?.or(Some(crate::report::TOP_N));
    let config = ctx.config()?;
    let (db, repo) = ctx.open_existing(&config)?;
    let entries = db.complexity_report(repo.id, limit)?;

    if ctx.is_json() {
        return to_json(&entries);
    }

    let mut out = format!(
        "{:>3} {:<50} {:>6} {:>6} {:>7}\n",
        "#", "FILE", "CPLX", "FUNCS", "AVG"
    );
    for (i, e) in entries.iter().enumerate() {
        out.push_str(&format!(
            "{:>3} {:<50} {:>6} {:>6} {:>7.2}\n",
            i + 1,
            truncate(&e.path, 50),
            e.complexity_score,
            e.function_count,
            e.avg_function_complexity
        ));
    }
    Ok(out)
}

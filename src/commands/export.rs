//! Export command handler - Dump the index as JSON

use serde::Serialize;

use crate::cli::ExportArgs;
use crate::commands::{to_json, CommandContext};
use crate::error::Result;
use crate::fs_utils;
use crate::storage::{
    now_timestamp, DependencyEdge, FileRow, FileSort, Repository, RepositoryMetrics,
};

/// Everything `export` emits, in one document
#[derive(Debug, Serialize)]
pub struct ExportDocument {
    pub exported_at: String,
    pub repository: Repository,
    pub files: Vec<FileRow>,
    pub dependencies: Vec<DependencyEdge>,
    pub metrics: RepositoryMetrics,
}

/// Run the export command. Always JSON, whatever `--format` says.
pub fn run_export(args: &ExportArgs, ctx: &CommandContext) -> Result<String> {
    let config = ctx.config()?;
    let (db, repository) = ctx.open_existing(&config)?;

    let document = ExportDocument {
        exported_at: now_timestamp(),
        files: db.list_files(repository.id, FileSort::Path, None)?,
        dependencies: db.dependency_graph(repository.id)?,
        metrics: db.repository_metrics(repository.id)?,
        repository,
    };
    let json = to_json(&document)?;

    match &args.output {
        Some(path) => {
            fs_utils::write_atomic(path, json.as_bytes())?;
            Ok(format!(
                "Exported {} files to {}\n",
                document.files.len(),
                path.display()
            ))
        }
        None => Ok(json),
    }
}

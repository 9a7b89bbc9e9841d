//! repo-index CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use repo_index::commands::{self, CommandContext};
use repo_index::{Cli, Commands};

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version land here too
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_logging(cli.verbose);

    match run(&cli) {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

/// Logs go to stderr; stdout carries command output only
fn init_logging(verbose: bool) {
    let default = if verbose { "repo_index=info" } else { "repo_index=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: &Cli) -> repo_index::Result<String> {
    let ctx = CommandContext::from_cli(cli);

    match &cli.command {
        Commands::Scan(args) => commands::run_scan(args, &ctx),
        Commands::Stats => commands::run_stats(&ctx),
        Commands::Files(args) => commands::run_files(args, &ctx),
        Commands::Functions(args) => commands::run_functions(args, &ctx),
        Commands::Search(args) => commands::run_search(args, &ctx),
        Commands::Deps(args) => commands::run_deps(args, &ctx),
        Commands::Complexity(args) => commands::run_complexity(args, &ctx),
        Commands::Export(args) => commands::run_export(args, &ctx),
        Commands::Backup(args) => commands::run_backup(args, &ctx),
    }
}

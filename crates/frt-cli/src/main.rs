//! FRT CLI
//!
//! Plans, applies, records and restores synchronization runs from a staging
//! tree into a target tree.

mod cli;
mod commands;
mod error;
mod prompt;

use clap::{CommandFactory, Parser};
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::{Cli, Commands};
use error::Result;
use frt_core::{CONFIG_FILE_NAMES, WorkspaceConfig};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let Some(cmd) = cli.command else {
        println!("{} File tree synchronizer", "frt".green().bold());
        println!();
        println!("Run {} for available commands.", "frt --help".cyan());
        return Ok(());
    };

    match cmd {
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "frt", &mut std::io::stdout());
            return Ok(());
        }
        Commands::Init { force } => {
            let path = match cli.config {
                Some(path) => path,
                None => std::env::current_dir()?.join(CONFIG_FILE_NAMES[0]),
            };
            return commands::run_init(&path, force);
        }
        _ => {}
    }

    let config = match &cli.config {
        Some(path) => WorkspaceConfig::load(path)?,
        None => WorkspaceConfig::discover(&std::env::current_dir()?)?,
    };
    tracing::debug!(?config, "workspace resolved");
    execute_command(cmd, config)
}

/// Logs go to stderr so JSON output on stdout stays parseable.
fn init_tracing(verbose: bool) {
    let installed = if verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber).map_err(|e| e.to_string())
    } else {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| e.to_string())
    };
    if let Err(e) = installed {
        eprintln!("{}: could not install logger: {}", "warning".yellow().bold(), e);
    }
    tracing::debug!("Verbose mode enabled");
}

fn execute_command(cmd: Commands, config: WorkspaceConfig) -> Result<()> {
    match cmd {
        Commands::Plan {
            delete,
            prune,
            json,
        } => commands::run_plan(config, delete, prune, json),
        Commands::Update { yes, prune } => commands::run_update(config, prune, yes),
        Commands::Delete { yes } => commands::run_delete(config, yes),
        Commands::List { json } => commands::run_list(config, json),
        Commands::Restore { entry, yes } => commands::run_restore(config, &entry, yes),
        Commands::RemoveEntry { entry } => commands::run_remove_entry(config, &entry),
        Commands::Init { .. } | Commands::Completions { .. } => Ok(()),
    }
}

//! CLI argument parsing using clap derive

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// FRT - Synchronize a target tree from a staging tree, reversibly
#[derive(Parser, Debug)]
#[command(name = "frt")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Workspace configuration file (defaults to frt.toml in the current directory)
    #[arg(short, long, global = true, env = "FRT_CONFIG")]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Write a default configuration and create the workspace directories
    ///
    /// The file goes to `--config` when given, otherwise to `frt.toml` in
    /// the current directory.
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Show what a run would do, without changing anything
    Plan {
        /// Plan the delete tree instead of the staging tree
        #[arg(long)]
        delete: bool,

        /// Also delete content units found only in the target
        #[arg(long, conflicts_with = "delete")]
        prune: bool,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Apply the staging tree to the target and record the run
    Update {
        /// Do not ask before applying
        #[arg(short, long)]
        yes: bool,

        /// Also delete content units found only in the target
        #[arg(long)]
        prune: bool,
    },

    /// Delete the target files named by the delete tree and record the run
    Delete {
        /// Do not ask before applying
        #[arg(short, long)]
        yes: bool,
    },

    /// List recorded runs
    List {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Undo a recorded run
    ///
    /// Examples:
    ///   frt restore backup-20260131-143045
    ///   frt restore backup-20260131-143045 --yes   # roll back on failure
    Restore {
        /// Catalog entry name, as shown by `frt list`
        entry: String,

        /// Answer prompts without asking: never retry, always roll back
        #[arg(short, long)]
        yes: bool,
    },

    /// Delete a recorded run and the backups only it needed
    RemoveEntry {
        /// Catalog entry name, as shown by `frt list`
        entry: String,
    },

    /// Generate shell completions
    ///
    /// Examples:
    ///   frt completions bash > ~/.local/share/bash-completion/completions/frt
    ///   frt completions zsh > ~/.zfunc/_frt
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_plan_delete() {
        let cli = Cli::parse_from(["frt", "plan", "--delete"]);
        assert_eq!(
            cli.command,
            Some(Commands::Plan {
                delete: true,
                prune: false,
                json: false
            })
        );
    }

    #[test]
    fn parse_global_config_after_subcommand() {
        let cli = Cli::parse_from(["frt", "list", "--config", "/tmp/frt.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/frt.toml")));
    }

    #[test]
    fn parse_restore_requires_entry() {
        assert!(Cli::try_parse_from(["frt", "restore"]).is_err());
        let cli = Cli::parse_from(["frt", "restore", "backup-1", "-y"]);
        assert_eq!(
            cli.command,
            Some(Commands::Restore {
                entry: "backup-1".to_string(),
                yes: true
            })
        );
    }

    #[test]
    fn parse_init_force() {
        let cli = Cli::parse_from(["frt", "init", "--force"]);
        assert_eq!(cli.command, Some(Commands::Init { force: true }));
    }

    #[test]
    fn plan_prune_conflicts_with_delete() {
        assert!(Cli::try_parse_from(["frt", "plan", "--delete", "--prune"]).is_err());
    }
}

//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// pbx-sync - Reconcile declared extensions with the telephony configuration
#[derive(Parser, Debug)]
#[command(name = "pbx-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to ./pbx-sync.toml when present)
    #[arg(short, long, global = true, env = "PBX_SYNC_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create the generated config file and write infrastructure blocks
    Init,

    /// Show how every extension compares between both sides
    Status,

    /// Startup pass: write infrastructure, auto-sync if enabled, show status
    Start,

    /// Heal one-sided drift and report conflicts
    Auto,

    /// Write declared records into the generated config
    ///
    /// Examples:
    ///   pbx-sync push 101      # one extension
    ///   pbx-sync push --all    # every declared-only or mismatched extension
    Push {
        /// Extension number
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        number: Option<String>,

        #[arg(long)]
        all: bool,
    },

    /// Record runtime state in the declared store
    Pull {
        /// Extension number
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        number: Option<String>,

        #[arg(long)]
        all: bool,
    },

    /// Enable an extension and write its section
    Enable { number: String },

    /// Disable an extension, commenting out its section
    Disable { number: String },

    /// Delete an extension from both sides
    Delete { number: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_push_requires_target() {
        assert!(Cli::try_parse_from(["pbx-sync", "push"]).is_err());
        assert!(Cli::try_parse_from(["pbx-sync", "push", "101", "--all"]).is_err());

        let cli = Cli::try_parse_from(["pbx-sync", "-v", "push", "--all"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(
            cli.command,
            Commands::Push {
                number: None,
                all: true
            }
        );
    }
}

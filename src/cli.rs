//! CLI definitions for FormPilot.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// FormPilot CLI.
#[derive(Parser)]
#[command(name = "formpilot")]
#[command(about = "Fill job-application forms in your browser with a language model")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (default: ~/.formpilot/config.toml)
    #[arg(short, long, global = true, env = "FORMPILOT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Attach to the browser and start the command loop (default)
    Run,

    /// Configuration file commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

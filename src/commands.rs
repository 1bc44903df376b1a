//! CLI command definitions
//!
//! Defines the clap commands for the smoke-test CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the MCP server and run the smoke scenario against it
    Run {
        /// Config file (default: the platform config directory)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Server executable, overriding the config file (e.g. node)
        #[arg(long)]
        server: Option<String>,

        /// Verbose output: response previews and full error chains
        #[arg(long, short)]
        debug: bool,

        /// Arguments to pass to the server, overriding the config file
        #[arg(last = true)]
        args: Vec<String>,
    },

    /// Show the resolved configuration
    Config {
        /// Config file (default: the platform config directory)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

//! test-mcp - smoke test for the LifeUp MCP server
//!
//! Launches the server over stdio, checks the MCP handshake and a read and
//! a write tool, and exits 0 only if every checkpoint passed.

use clap::Parser;
use lifeup_smoke::{cli, commands};
use commands::Commands;

#[derive(Parser)]
#[command(name = "test-mcp", about = "Smoke test for the LifeUp MCP server")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli::dispatch(cli.command).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

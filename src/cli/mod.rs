//! CLI command handling
//!
//! Resolves configuration, runs the smoke scenario and formats output.

use std::path::PathBuf;
use std::time::Duration;

use serde_json::json;

use crate::commands::Commands;
use crate::common::config::{Config, Settings};
use crate::common::{logging, paths, Result};
use crate::mcp::{LaunchSpec, McpClient};
use crate::scenario::{report, ScenarioRunner};

/// Dispatch a CLI command, returning the process exit code
pub async fn dispatch(command: Commands) -> Result<i32> {
    match command {
        Commands::Run {
            config,
            server,
            debug,
            args,
        } => {
            let mut config = Config::load(config.as_deref())?;
            if let Some(server) = server {
                config.server.command = server;
            }
            if !args.is_empty() {
                config.server.args = args;
            }

            let mut settings = Settings::from_env(&config.lifeup)?;
            settings.debug |= debug;
            logging::init(settings.debug);

            run_smoke_test(config, settings).await
        }

        Commands::Config { config, json } => {
            let explicit = config.clone();
            let config = Config::load(config.as_deref())?;
            let settings = Settings::from_env(&config.lifeup)?;

            if json {
                let out = json!({
                    "configFile": config_file(explicit).map(|p| p.display().to_string()),
                    "lifeup": settings,
                    "server": config.server,
                    "scenario": config.scenario,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                print_config(&config, &settings, explicit);
            }

            Ok(0)
        }
    }
}

async fn run_smoke_test(config: Config, settings: Settings) -> Result<i32> {
    report::info(format!("Testing MCP server: {}", config.server.display()));
    report::info(format!("LifeUp API: {}", settings.base_url));
    if settings.api_token.is_none() {
        report::info("No API token configured, the server will run unauthenticated");
    }

    let launch = LaunchSpec::new(config.server.command.clone(), config.server.args.clone())
        .with_env(settings.child_env());
    let client = McpClient::new(launch, Duration::from_millis(settings.timeout_ms));
    let mut runner = ScenarioRunner::new(client, config.scenario, settings.debug);

    // Run on its own task so a panic still ends in a failing exit code
    let handle = tokio::spawn(async move { runner.run().await });

    match handle.await {
        Ok(outcome) => Ok(outcome.exit_code()),
        Err(e) => {
            report::error(format!("Smoke test crashed: {}", e));
            Ok(1)
        }
    }
}

/// The config file that was (or would be) read
fn config_file(explicit: Option<PathBuf>) -> Option<PathBuf> {
    explicit.or_else(|| paths::config_path().filter(|p| p.exists()))
}

fn print_config(config: &Config, settings: &Settings, explicit: Option<PathBuf>) {
    match config_file(explicit) {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: none (using defaults)"),
    }

    println!();
    println!("LifeUp:");
    println!("  Host:        {}", settings.host);
    println!("  Port:        {}", settings.port);
    println!("  Base URL:    {}", settings.base_url);
    println!(
        "  API token:   {}",
        settings.masked_token().unwrap_or_else(|| "(not set)".to_string())
    );
    println!("  Timeout:     {} ms", settings.timeout_ms);
    println!("  Retries:     {}", settings.retry_count);
    println!("  Debug:       {}", settings.debug);

    println!();
    println!("Server:");
    println!("  Command:     {}", config.server.display());

    println!();
    println!("Scenario:");
    println!("  Read tool:   {}", config.scenario.read_tool);
    println!("  Create tool: {}", config.scenario.create_tool);
    println!("  Delete tool: {}", config.scenario.delete_tool);
    println!("  Settle:      {} ms", config.scenario.settle_ms);
}

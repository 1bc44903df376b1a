//! Scenario runner implementation
//!
//! Runs the fixed smoke scenario against a [`ToolSession`]: launch,
//! connect, list tools, probe a read tool, probe a create tool and clean up
//! after it. Only launch and connect failures stop the run; every later
//! step is an independent probe.

use colored::Colorize;

use crate::common::{Error, Result};
use crate::mcp::{CallToolResult, ToolSession};

use super::checkpoints::{Checkpoint, Checkpoints};
use super::config::ScenarioConfig;
use super::diagnostics;
use super::extract::extract_created_id;
use super::report::{self, PREVIEW_CHARS};

/// Outcome of one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepOutcome {
    Passed,
    Failed,
}

/// What happened to the entity made by the create probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cleanup {
    /// Identifier parsed from the create response
    pub id: u64,
    /// Whether the delete call succeeded
    pub deleted: bool,
}

/// Result of a scenario run
#[derive(Debug)]
pub struct ScenarioReport {
    pub checkpoints: Checkpoints,
    /// Message of the fault that aborted the run, if any
    pub fatal: Option<String>,
    /// Set when a created ID was found and a delete was attempted
    pub cleanup: Option<Cleanup>,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.fatal.is_none() && self.checkpoints.all_passed()
    }

    /// Process exit code: 0 when every checkpoint passed, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        if self.passed() {
            0
        } else {
            1
        }
    }
}

/// Drives the smoke scenario over a session it owns for the whole run
pub struct ScenarioRunner<S: ToolSession> {
    session: S,
    config: ScenarioConfig,
    debug: bool,
    cleanup: Option<Cleanup>,
}

impl<S: ToolSession> ScenarioRunner<S> {
    pub fn new(session: S, config: ScenarioConfig, debug: bool) -> Self {
        Self {
            session,
            config,
            debug,
            cleanup: None,
        }
    }

    /// Give the session back once the run is over
    pub fn into_session(self) -> S {
        self.session
    }

    /// Run every step, close the session, print the summary
    ///
    /// The session is closed exactly once whatever happened; errors while
    /// closing are logged and otherwise ignored.
    pub async fn run(&mut self) -> ScenarioReport {
        let mut checkpoints = Checkpoints::new();

        let fatal = match self.run_steps(&mut checkpoints).await {
            Ok(()) => None,
            Err(e) => {
                self.report_failure("Smoke test aborted", &e);
                Some(e.to_string())
            }
        };

        if let Err(e) = self.session.close().await {
            tracing::debug!("Ignoring error while closing MCP session: {}", e);
        }

        report::print_summary(&checkpoints);

        ScenarioReport {
            checkpoints,
            fatal,
            cleanup: self.cleanup.take(),
        }
    }

    async fn run_steps(&mut self, checkpoints: &mut Checkpoints) -> Result<()> {
        for checkpoint in Checkpoint::ALL {
            if self.execute(checkpoint).await? == StepOutcome::Passed {
                checkpoints.mark(checkpoint);
            }
        }
        Ok(())
    }

    /// Execute the step for one checkpoint. `Err` aborts the run.
    async fn execute(&mut self, checkpoint: Checkpoint) -> Result<StepOutcome> {
        match checkpoint {
            Checkpoint::Startup => self.launch().await,
            Checkpoint::Connection => self.connect().await,
            Checkpoint::ToolListing => Ok(self.list_tools().await),
            Checkpoint::ReadOperation => Ok(self.probe_read().await),
            Checkpoint::CreateOperation => Ok(self.probe_create().await),
        }
    }

    async fn launch(&mut self) -> Result<StepOutcome> {
        report::info("Starting MCP server...");
        self.session.start().await?;
        report::info(format!("{} Server process started", "✓".green()));
        Ok(StepOutcome::Passed)
    }

    async fn connect(&mut self) -> Result<StepOutcome> {
        report::info("Connecting to MCP server...");
        let server = self.session.connect().await?;
        report::info(format!(
            "{} Connected to {} {}",
            "✓".green(),
            server.name,
            server.version
        ));

        let delay = self.config.settle_delay();
        if !delay.is_zero() {
            tracing::debug!("Waiting {:?} for the server to settle", delay);
            tokio::time::sleep(delay).await;
        }
        Ok(StepOutcome::Passed)
    }

    async fn list_tools(&mut self) -> StepOutcome {
        report::info("Listing tools...");
        match self.session.list_tools().await {
            Ok(tools) => {
                // An empty list still proves the round trip works
                report::info(format!(
                    "{} Server exposes {} tools",
                    "✓".green(),
                    tools.len()
                ));
                if self.debug {
                    for tool in &tools {
                        report::info(format!("  - {}", tool.name));
                    }
                }
                StepOutcome::Passed
            }
            Err(e) => {
                self.report_failure("Listing tools failed", &e);
                StepOutcome::Failed
            }
        }
    }

    async fn probe_read(&mut self) -> StepOutcome {
        let tool = &self.config.read_tool;
        report::info(format!("Calling read tool '{}'...", tool));

        match self.session.call_tool(tool, self.config.read_arguments()).await {
            Ok(result) if !result.is_error => {
                report::info(format!("{} Read tool '{}' succeeded", "✓".green(), tool));
                self.show_preview(&result);
                StepOutcome::Passed
            }
            Ok(result) => {
                self.report_tool_error(tool, &result);
                StepOutcome::Failed
            }
            Err(e) => {
                self.report_failure(&format!("Read tool '{}' failed", tool), &e);
                StepOutcome::Failed
            }
        }
    }

    async fn probe_create(&mut self) -> StepOutcome {
        let tool = self.config.create_tool.clone();
        report::info(format!("Calling create tool '{}'...", tool));

        match self.session.call_tool(&tool, self.config.create_arguments()).await {
            Ok(result) if !result.is_error => {
                report::info(format!("{} Create tool '{}' succeeded", "✓".green(), tool));
                self.show_preview(&result);

                match extract_created_id(&result.text()) {
                    Some(id) => self.delete_created(id).await,
                    None => report::info("No created ID in the response, skipping cleanup"),
                }
                StepOutcome::Passed
            }
            Ok(result) => {
                self.report_tool_error(&tool, &result);
                StepOutcome::Failed
            }
            Err(e) => {
                self.report_failure(&format!("Create tool '{}' failed", tool), &e);
                StepOutcome::Failed
            }
        }
    }

    /// Best-effort removal of the entity the create probe made
    async fn delete_created(&mut self, id: u64) {
        let tool = &self.config.delete_tool;
        report::info(format!("Cleaning up: calling '{}' for ID {}...", tool, id));

        let failure = match self.session.call_tool(tool, self.config.delete_arguments(id)).await {
            Ok(result) if !result.is_error => None,
            Ok(result) => Some(result.text()),
            Err(e) => Some(e.to_string()),
        };

        match &failure {
            None => report::info(format!("{} Cleaned up created entity {}", "✓".green(), id)),
            Some(reason) => report::info(format!(
                "Could not delete entity {} ({}). LifeUp safety mode may block deletion; remove it manually",
                id, reason
            )),
        }

        self.cleanup = Some(Cleanup {
            id,
            deleted: failure.is_none(),
        });
    }

    fn show_preview(&self, result: &CallToolResult) {
        if self.debug {
            report::info(format!(
                "  Response: {}",
                report::preview(&result.text(), PREVIEW_CHARS).dimmed()
            ));
        }
    }

    fn report_tool_error(&self, tool: &str, result: &CallToolResult) {
        let text = result.text();
        report::error(format!("Tool '{}' returned an error: {}", tool, text));
        diagnostics::diagnose(&text);
    }

    fn report_failure(&self, context: &str, e: &Error) {
        report::error(format!("{}: {}", context, e));
        if self.debug {
            report::error(error_chain(e));
        }
        diagnostics::diagnose(&e.to_string());
    }
}

/// Debug rendering of an error followed by its source chain
fn error_chain(e: &Error) -> String {
    let mut out = format!("{:?}", e);
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        out.push_str(&format!("\n  caused by: {}", cause));
        source = cause.source();
    }
    out
}

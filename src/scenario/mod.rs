//! MCP smoke scenario
//!
//! Launches the LifeUp MCP server, checks that it speaks the protocol and
//! that one read and one write tool work end to end, then reports a
//! pass/fail verdict per checkpoint.

mod checkpoints;
mod config;
pub mod diagnostics;
mod extract;
pub mod report;
mod runner;

pub use checkpoints::{Checkpoint, Checkpoints};
pub use config::ScenarioConfig;
pub use diagnostics::{classify, Diagnosis};
pub use extract::extract_created_id;
pub use runner::{Cleanup, ScenarioReport, ScenarioRunner};

//! LifeUp MCP smoke test
//!
//! This library drives an MCP server over stdio through a fixed scenario
//! (startup, handshake, tool listing, one read call, one create call) and
//! reports a verdict per checkpoint.

pub mod cli;
pub mod commands;
pub mod common;
pub mod mcp;
pub mod scenario;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use mcp::ToolSession;

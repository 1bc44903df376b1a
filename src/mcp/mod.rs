//! Model Context Protocol (MCP) client side
//!
//! This module implements just enough of MCP over stdio to drive a
//! server through a smoke test: launch, handshake, list tools, call tools.

pub mod client;
pub mod codec;
pub mod transport;
pub mod types;

use async_trait::async_trait;
use serde_json::Value;

use crate::common::Result;

pub use client::McpClient;
pub use transport::{LaunchSpec, StdioTransport};
pub use types::*;

/// A session with a tool-serving process
///
/// [`McpClient`] is the real implementation; the scenario runner only sees
/// this trait so it can be exercised against scripted sessions.
#[async_trait]
pub trait ToolSession: Send {
    /// Start the server process
    async fn start(&mut self) -> Result<()>;

    /// Perform the protocol handshake, returning the server's identity
    async fn connect(&mut self) -> Result<Implementation>;

    /// List every tool the server exposes
    async fn list_tools(&mut self) -> Result<Vec<Tool>>;

    /// Invoke a tool. A tool-level failure is an `Ok` result with
    /// `is_error` set; `Err` means the call itself did not complete.
    async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<CallToolResult>;

    /// End the session and stop the server. Safe to call when never started.
    async fn close(&mut self) -> Result<()>;
}

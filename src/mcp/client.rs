//! MCP client for talking to a stdio MCP server
//!
//! This module handles the session with the server under test: the
//! initialize handshake, tool listing and tool calls.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::common::{Error, Result};

use super::transport::{LaunchSpec, StdioTransport};
use super::types::*;
use super::ToolSession;

/// How long the server gets to exit after its stdin is closed
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Upper bound on tools/list pages, in case a server keeps handing out cursors
const MAX_TOOL_PAGES: usize = 64;

/// MCP client bound to one server launch
pub struct McpClient {
    /// How to start the server
    launch: LaunchSpec,
    /// Per-request timeout
    request_timeout: Duration,
    /// Channel to the running server (None before start and after close)
    transport: Option<StdioTransport>,
    /// Next JSON-RPC request id
    next_id: u64,
}

impl McpClient {
    /// Create a client; nothing is started until [`ToolSession::start`]
    pub fn new(launch: LaunchSpec, request_timeout: Duration) -> Self {
        Self {
            launch,
            request_timeout,
            transport: None,
            next_id: 1,
        }
    }

    fn transport(&mut self) -> Result<&mut StdioTransport> {
        self.transport.as_mut().ok_or(Error::ServerNotStarted)
    }

    async fn send<M: Serialize>(&mut self, message: &M) -> Result<()> {
        let json = serde_json::to_string(message)?;
        tracing::debug!("MCP >>> {}", json);
        self.transport()?.send(&json).await
    }

    async fn read_message(&mut self) -> Result<IncomingMessage> {
        let json = self.transport()?.recv().await?;
        tracing::debug!("MCP <<< {}", json);
        serde_json::from_str(&json).map_err(|e| Error::Protocol(format!("Invalid JSON: {}", e)))
    }

    /// Send a notification (no response expected)
    pub async fn notify(&mut self, method: &str, params: Option<Value>) -> Result<()> {
        self.send(&JsonRpcNotification {
            jsonrpc: "2.0",
            method,
            params,
        })
        .await
    }

    /// Send a request and wait for its response, bounded by the request timeout
    pub async fn request<T: DeserializeOwned>(
        &mut self,
        method: &str,
        params: Option<Value>,
    ) -> Result<T> {
        let timeout = self.request_timeout;
        match tokio::time::timeout(timeout, self.exchange(method, params)).await {
            Ok(result) => result,
            Err(_) => Err(Error::timeout(method, timeout.as_millis() as u64)),
        }
    }

    /// Send a request and read until its response arrives
    ///
    /// Server notifications are logged and skipped; server requests are
    /// answered so the server never blocks on us.
    async fn exchange<T: DeserializeOwned>(
        &mut self,
        method: &str,
        params: Option<Value>,
    ) -> Result<T> {
        let id = self.next_id;
        self.next_id += 1;

        self.send(&JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        })
        .await?;

        loop {
            let msg = self.read_message().await?;

            match (msg.id, msg.method) {
                (Some(msg_id), None) => {
                    if msg_id.as_u64() != Some(id) {
                        tracing::warn!("Ignoring response to unknown request {}", msg_id);
                        continue;
                    }
                    if let Some(error) = msg.error {
                        return Err(Error::request_failed(method, error.code, &error.message));
                    }
                    let result = msg.result.unwrap_or(Value::Null);
                    return serde_json::from_value(result).map_err(|e| {
                        Error::Protocol(format!("Failed to parse {} response: {}", method, e))
                    });
                }
                (Some(request_id), Some(server_method)) => {
                    self.answer_server_request(request_id, &server_method).await?;
                }
                (None, Some(notification)) => {
                    tracing::debug!("Server notification: {}", notification);
                }
                (None, None) => {
                    tracing::warn!("Ignoring message with neither id nor method");
                }
            }
        }
    }

    async fn answer_server_request(&mut self, id: Value, method: &str) -> Result<()> {
        let reply = if method == "ping" {
            json!({ "jsonrpc": "2.0", "id": id, "result": {} })
        } else {
            tracing::debug!("Rejecting unsupported server request: {}", method);
            json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": JsonRpcError {
                    code: METHOD_NOT_FOUND,
                    message: format!("Method not found: {}", method),
                    data: None,
                }
            })
        };
        self.send(&reply).await
    }
}

#[async_trait]
impl ToolSession for McpClient {
    async fn start(&mut self) -> Result<()> {
        if self.transport.is_some() {
            return Err(Error::Internal("MCP server already started".to_string()));
        }
        self.transport = Some(StdioTransport::launch(&self.launch)?);
        Ok(())
    }

    async fn connect(&mut self) -> Result<Implementation> {
        let params = serde_json::to_value(InitializeParams::default())?;
        let result: InitializeResult = self
            .request("initialize", Some(params))
            .await
            .map_err(|e| Error::HandshakeFailed(e.to_string()))?;

        self.notify("notifications/initialized", None)
            .await
            .map_err(|e| Error::HandshakeFailed(e.to_string()))?;

        tracing::debug!(
            "Connected to {} {} (protocol {})",
            result.server_info.name,
            result.server_info.version,
            result.protocol_version
        );

        Ok(result.server_info)
    }

    async fn list_tools(&mut self) -> Result<Vec<Tool>> {
        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_TOOL_PAGES {
            let params = cursor.as_ref().map(|c| json!({ "cursor": c }));
            let page: ListToolsResult = self.request("tools/list", params).await?;
            tools.extend(page.tools);

            match page.next_cursor {
                Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
                _ => return Ok(tools),
            }
        }

        tracing::warn!("tools/list still paginating after {} pages", MAX_TOOL_PAGES);
        Ok(tools)
    }

    async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<CallToolResult> {
        let params = serde_json::to_value(CallToolParams { name, arguments })?;
        self.request("tools/call", Some(params)).await
    }

    async fn close(&mut self) -> Result<()> {
        match self.transport.take() {
            Some(mut transport) => transport.shutdown(CLOSE_GRACE).await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_requests_before_start_fail() {
        let mut client = McpClient::new(
            LaunchSpec::new("unused", Vec::new()),
            Duration::from_secs(1),
        );
        assert!(matches!(client.list_tools().await, Err(Error::ServerNotStarted)));
        // Closing a client that never started is a no-op
        client.close().await.unwrap();
        client.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_start_failure_surfaces_launch_error() {
        let mut client = McpClient::new(
            LaunchSpec::new("/nonexistent/lifeup-mcp-server", Vec::new()),
            Duration::from_secs(1),
        );
        let err = client.start().await.unwrap_err();
        assert!(err.is_launch_failure());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_handshake_fails_when_server_exits() {
        let mut client = McpClient::new(
            LaunchSpec::new("true", Vec::new()),
            Duration::from_secs(5),
        );
        client.start().await.unwrap();
        let err = client.connect().await.unwrap_err();
        assert!(matches!(err, Error::HandshakeFailed(_)));
        client.close().await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_request_times_out() {
        // `sleep` never answers
        let mut client = McpClient::new(
            LaunchSpec::new("sleep", vec!["30".to_string()]),
            Duration::from_millis(200),
        );
        client.start().await.unwrap();
        let err = client.list_tools().await.unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
        client.close().await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_late_reply_after_timeout_does_not_break_next_request() {
        // Answers the first request with half a line, finishes it after the
        // client has given up, then answers the second request promptly
        let script = r#"
read line
printf '{"jsonrpc":"2.0","id":1,'
sleep 1
printf '"result":{"tools":[]}}\n'
read line
printf '{"jsonrpc":"2.0","id":2,"result":{"tools":[{"name":"list_all_tasks"}]}}\n'
"#;
        let mut client = McpClient::new(
            LaunchSpec::new("sh", vec!["-c".to_string(), script.to_string()]),
            Duration::from_millis(400),
        );
        client.start().await.unwrap();

        let first = client.list_tools().await;
        assert!(matches!(first, Err(Error::Timeout { .. })), "{:?}", first);

        client.request_timeout = Duration::from_secs(5);
        let tools = client.list_tools().await.unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, "list_all_tasks");

        client.close().await.unwrap();
    }
}

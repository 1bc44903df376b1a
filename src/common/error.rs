//! Error types for the MCP smoke test
//!
//! Error messages are meant to be read by whoever is running the smoke
//! test, so they say what failed and, where possible, what to check.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the smoke test
#[derive(Error, Debug)]
pub enum Error {
    // === Server Process Errors ===
    #[error("MCP server command '{name}' not found. Searched: {searched}")]
    ServerNotFound { name: String, searched: String },

    #[error("MCP server failed to start: {0}")]
    ServerStartFailed(String),

    #[error("MCP server exited unexpectedly")]
    ServerExited,

    #[error("MCP server is not running. Start it before issuing requests")]
    ServerNotStarted,

    // === Protocol Errors ===
    #[error("MCP protocol error: {0}")]
    Protocol(String),

    #[error("MCP request '{method}' failed ({code}): {message}")]
    RequestFailed {
        method: String,
        code: i64,
        message: String,
    },

    #[error("MCP handshake failed: {0}")]
    HandshakeFailed(String),

    #[error("MCP request '{method}' timed out after {millis} ms")]
    Timeout { method: String, millis: u64 },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a server not found error with search locations
    pub fn server_not_found<S: AsRef<str>>(name: &str, paths: &[S]) -> Self {
        Self::ServerNotFound {
            name: name.to_string(),
            searched: paths.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join(", "),
        }
    }

    /// Create a request failed error from a JSON-RPC error object
    pub fn request_failed(method: &str, code: i64, message: &str) -> Self {
        Self::RequestFailed {
            method: method.to_string(),
            code,
            message: message.to_string(),
        }
    }

    /// Create a timeout error for a request
    pub fn timeout(method: &str, millis: u64) -> Self {
        Self::Timeout {
            method: method.to_string(),
            millis,
        }
    }

    /// Whether this error happened before the server could be talked to at all
    pub fn is_launch_failure(&self) -> bool {
        matches!(
            self,
            Error::ServerNotFound { .. } | Error::ServerStartFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_not_found_lists_searched_paths() {
        let err = Error::server_not_found("node", &["PATH", "/usr/local/bin"]);
        assert_eq!(
            err.to_string(),
            "MCP server command 'node' not found. Searched: PATH, /usr/local/bin"
        );
        assert!(err.is_launch_failure());
    }

    #[test]
    fn test_request_failed_message() {
        let err = Error::request_failed("tools/call", -32601, "Method not found");
        assert_eq!(
            err.to_string(),
            "MCP request 'tools/call' failed (-32601): Method not found"
        );
        assert!(!err.is_launch_failure());
    }
}

//! Error types for MCP operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from MCP server communication.
#[derive(Debug, Error)]
pub enum McpError {
    #[error("Failed to spawn MCP server '{name}' ({command}): {source}")]
    SpawnFailed {
        name: String,
        command: String,
        source: std::io::Error,
    },

    #[error(
        "MCP server '{name}': script {} must be a .js, .mjs, .cjs or .py file",
        .path.display()
    )]
    UnsupportedScript { name: String, path: PathBuf },

    #[error("MCP server '{name}' has neither a command nor a script path")]
    MissingLaunch { name: String },

    #[error("JSON-RPC error from '{server}' (code {code}): {message}")]
    JsonRpc {
        server: String,
        code: i64,
        message: String,
    },

    #[error("MCP protocol error: {0}")]
    Protocol(String),

    #[error("MCP server closed the connection")]
    ConnectionClosed,

    #[error("MCP request '{method}' timed out after {timeout_ms}ms")]
    Timeout { method: String, timeout_ms: u64 },

    #[error("Failed to connect to MCP server '{server}': {source}")]
    Connect {
        server: String,
        #[source]
        source: Box<McpError>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

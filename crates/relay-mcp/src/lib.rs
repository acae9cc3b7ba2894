//! MCP (Model Context Protocol) tool-server connections for Relay.
//!
//! Each configured server is spawned as a child process speaking
//! newline-delimited JSON-RPC 2.0 over stdio, initialized with a handshake,
//! and its tools are published under qualified names through
//! [`McpManager`], which implements [`relay_types::ToolRouter`].

pub mod client;
pub mod config;
pub mod error;
pub mod jsonrpc;
pub mod manager;
pub mod tool;
mod transport;

pub use client::{McpClient, McpToolInfo, McpToolResult};
pub use config::{LaunchCommand, McpConfig, McpServerConfig};
pub use error::McpError;
pub use manager::{McpManager, ServerSummary};
pub use tool::{QUALIFIER, qualify, split_qualified};

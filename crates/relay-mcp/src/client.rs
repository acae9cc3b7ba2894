//! MCP client: one live connection to one tool server.
//!
//! Handles the handshake (`initialize` + `notifications/initialized`), tool
//! discovery (`tools/list`), and tool invocation (`tools/call`).

use crate::config::McpServerConfig;
use crate::error::McpError;
use crate::tool::{is_api_tool_name, qualify};
use crate::transport::StdioTransport;
use serde::Deserialize;
use std::path::Path;

/// MCP protocol version we support.
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Information about a tool exposed by an MCP server.
#[derive(Debug, Clone, PartialEq)]
pub struct McpToolInfo {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// Result of calling a tool on an MCP server.
#[derive(Debug, Clone)]
pub struct McpToolResult {
    pub content: Vec<McpToolContent>,
    pub is_error: bool,
}

/// A content item in a tool result.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum McpToolContent {
    Text {
        text: String,
    },
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
    Resource {
        resource: EmbeddedResource,
    },
    #[serde(other)]
    Unsupported,
}

/// A resource embedded in a tool result.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddedResource {
    pub uri: String,
    #[serde(default)]
    pub text: Option<String>,
}

/// Client for a single MCP server.
pub struct McpClient {
    name: String,
    description: Option<String>,
    transport: StdioTransport,
    tools: Vec<McpToolInfo>,
}

#[derive(Deserialize)]
struct ToolsListResult {
    tools: Vec<ToolEntry>,
}

#[derive(Deserialize)]
struct ToolEntry {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default = "default_schema", rename = "inputSchema")]
    input_schema: serde_json::Value,
}

fn default_schema() -> serde_json::Value {
    serde_json::json!({"type": "object", "properties": {}})
}

#[derive(Deserialize)]
struct ToolCallResult {
    #[serde(default)]
    content: Vec<McpToolContent>,
    #[serde(default, rename = "isError")]
    is_error: bool,
}

impl McpClient {
    /// Connect to an MCP server: resolve launch, spawn, handshake, discover tools.
    ///
    /// Launch resolution happens first, so an unsupported script is rejected
    /// before any process exists. A server that fails after spawning is shut
    /// down before the error is returned.
    pub async fn connect(config: &McpServerConfig, cwd: &Path) -> Result<Self, McpError> {
        let launch = config.launch(cwd)?;
        tracing::debug!(
            "Starting MCP server '{}': {} {:?}",
            config.name,
            launch.program,
            launch.args
        );
        let transport =
            StdioTransport::spawn(&config.name, &launch, &config.env, config.timeout_ms)?;

        match handshake(&config.name, &transport).await {
            Ok(tools) => Ok(Self {
                name: config.name.clone(),
                description: config.description.clone(),
                transport,
                tools: publishable_tools(&config.name, tools),
            }),
            Err(e) => {
                if let Err(close_err) = transport.shutdown().await {
                    tracing::warn!(
                        "Failed to stop MCP server '{}' after handshake error: {close_err}",
                        config.name
                    );
                }
                Err(e)
            }
        }
    }

    /// Call a tool on this server by its original (unqualified) name.
    pub async fn call_tool(
        &self,
        tool_name: &str,
        arguments: serde_json::Value,
    ) -> Result<McpToolResult, McpError> {
        let params = serde_json::json!({
            "name": tool_name,
            "arguments": arguments,
        });

        let result = self
            .transport
            .send_request("tools/call", Some(params))
            .await?
            .into_result(&self.name, "tools/call")?;

        let call_result: ToolCallResult = serde_json::from_value(result)
            .map_err(|e| McpError::Protocol(format!("Failed to parse tools/call result: {e}")))?;

        Ok(McpToolResult {
            content: call_result.content,
            is_error: call_result.is_error,
        })
    }

    /// The tools this server advertised at connect time.
    pub fn tools(&self) -> &[McpToolInfo] {
        &self.tools
    }

    /// Whether this server advertised a tool with the given original name.
    pub fn has_tool(&self, tool_name: &str) -> bool {
        self.tools.iter().any(|t| t.name == tool_name)
    }

    pub fn server_name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Close the connection and stop the server process.
    pub async fn shutdown(self) -> Result<(), McpError> {
        self.transport.shutdown().await
    }
}

/// Drop tools whose qualified name the model API would reject. One bad name
/// would otherwise fail every request that carries the catalog.
fn publishable_tools(server: &str, tools: Vec<McpToolInfo>) -> Vec<McpToolInfo> {
    tools
        .into_iter()
        .filter(|t| {
            let qualified = qualify(server, &t.name);
            let ok = is_api_tool_name(&qualified);
            if !ok {
                tracing::warn!(
                    "Skipping tool '{}' on server '{server}': '{qualified}' is not a valid tool name",
                    t.name
                );
            }
            ok
        })
        .collect()
}

/// Run the protocol handshake and fetch the tool catalog.
async fn handshake(server: &str, transport: &StdioTransport) -> Result<Vec<McpToolInfo>, McpError> {
    let init_params = serde_json::json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {},
        "clientInfo": {
            "name": format!("relay-{server}"),
            "version": env!("CARGO_PKG_VERSION")
        }
    });

    transport
        .send_request("initialize", Some(init_params))
        .await?
        .into_result(server, "initialize")?;

    transport
        .send_notification("notifications/initialized", None)
        .await?;

    let result = transport
        .send_request("tools/list", None)
        .await?
        .into_result(server, "tools/list")?;

    let list: ToolsListResult = serde_json::from_value(result)
        .map_err(|e| McpError::Protocol(format!("Failed to parse tools/list response: {e}")))?;

    Ok(list
        .tools
        .into_iter()
        .map(|t| McpToolInfo {
            name: t.name,
            description: t.description.unwrap_or_default(),
            input_schema: t.input_schema,
        })
        .collect())
}

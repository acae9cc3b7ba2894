//! MCP manager: the connection table and the unified tool catalog.

use crate::client::McpClient;
use crate::config::McpConfig;
use crate::error::McpError;
use crate::tool::{qualify, render_content, split_qualified};
use relay_types::{ResolvedTool, ToolDefinition, ToolError, ToolOutput, ToolRouter};
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

/// One connected server, as shown at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerSummary<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub tool_count: usize,
}

/// Owns one live connection per configured server, in config order.
///
/// Built once by [`McpManager::connect_all`] and read-only until
/// [`McpManager::shutdown`].
pub struct McpManager {
    clients: Vec<McpClient>,
}

impl McpManager {
    /// Connect to every configured server, one at a time, in listed order.
    ///
    /// Fails fast: the first server that cannot be started aborts startup.
    /// Servers connected before it are shut down, so nothing is left running
    /// and no partial table is returned.
    pub async fn connect_all(config: &McpConfig, cwd: &Path) -> Result<Self, McpError> {
        let mut clients: Vec<McpClient> = Vec::with_capacity(config.servers.len());

        for server_config in &config.servers {
            match McpClient::connect(server_config, cwd).await {
                Ok(client) => {
                    let names: Vec<String> = client
                        .tools()
                        .iter()
                        .map(|t| qualify(client.server_name(), &t.name))
                        .collect();
                    tracing::info!(
                        "Connected to server \"{}\" with tools: {:?}",
                        server_config.name,
                        names
                    );
                    clients.push(client);
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to server \"{}\": {e}",
                        server_config.name
                    );
                    Self { clients }.shutdown().await;
                    return Err(McpError::Connect {
                        server: server_config.name.clone(),
                        source: Box::new(e),
                    });
                }
            }
        }

        Ok(Self { clients })
    }

    /// Number of connected servers.
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Connected servers with their published tool counts, in config order.
    pub fn server_summary(&self) -> Vec<ServerSummary<'_>> {
        self.clients
            .iter()
            .map(|c| ServerSummary {
                name: c.server_name(),
                description: c.description(),
                tool_count: c.tools().len(),
            })
            .collect()
    }

    fn client(&self, server: &str) -> Option<&McpClient> {
        self.clients.iter().find(|c| c.server_name() == server)
    }

    /// Close every connection. A failure on one server is logged and the
    /// sweep continues with the rest.
    pub async fn shutdown(self) {
        for client in self.clients {
            let name = client.server_name().to_string();
            match client.shutdown().await {
                Ok(()) => tracing::debug!("MCP server '{name}' stopped"),
                Err(e) => tracing::warn!("Failed to close MCP server '{name}': {e}"),
            }
        }
    }
}

impl ToolRouter for McpManager {
    fn catalog(&self) -> Vec<ToolDefinition> {
        self.clients
            .iter()
            .flat_map(|client| {
                client.tools().iter().map(move |tool| ToolDefinition {
                    name: qualify(client.server_name(), &tool.name),
                    description: tool.description.clone(),
                    input_schema: tool.input_schema.clone(),
                })
            })
            .collect()
    }

    fn resolve(&self, qualified_name: &str) -> Option<ResolvedTool> {
        let (server, tool) = split_qualified(qualified_name)?;
        let client = self.client(server)?;
        if !client.has_tool(tool) {
            return None;
        }
        Some(ResolvedTool {
            qualified_name: qualified_name.to_string(),
            server: server.to_string(),
            tool: tool.to_string(),
        })
    }

    fn call_tool<'a>(
        &'a self,
        tool: &'a ResolvedTool,
        arguments: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutput, ToolError>> + Send + 'a>> {
        Box::pin(async move {
            let client = self
                .client(&tool.server)
                .ok_or_else(|| ToolError::UnknownTool {
                    name: tool.qualified_name.clone(),
                })?;

            let result = client
                .call_tool(&tool.tool, arguments)
                .await
                .map_err(|e| ToolError::ExecutionFailed {
                    server: tool.server.clone(),
                    tool: tool.tool.clone(),
                    message: e.to_string(),
                })?;

            let text = render_content(&result.content);
            Ok(if result.is_error {
                ToolOutput::error(text)
            } else {
                ToolOutput::text(text)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::McpServerConfig;
    use std::path::PathBuf;

    /// Tools advertised by the default mock server.
    const PING_TOOLS: &str =
        r#"[{"name":"ping","description":"Ping","inputSchema":{"type":"object"}}]"#;

    /// `tools/call` result of the default mock server.
    const PONG: &str = r#"{"content":[{"type":"text","text":"pong"}]}"#;

    /// A shell-script MCP server that answers `tools/list` with `tools` and
    /// every `tools/call` with `call_result`. Both must be JSON without `'`.
    fn mock_script(tools: &str, call_result: &str) -> String {
        format!(
            r#"while IFS= read -r line; do
  id=$(printf '%s' "$line" | sed -n 's/.*"id":\([0-9]*\).*/\1/p')
  [ -z "$id" ] && continue
  case "$line" in
    *'"tools/list"'*) result='{{"tools":{tools}}}' ;;
    *'"tools/call"'*) result='{call_result}' ;;
    *) result='{{}}' ;;
  esac
  printf '{{"jsonrpc":"2.0","id":%s,"result":%s}}\n' "$id" "$result"
done"#
        )
    }

    fn mock_server_with(name: &str, tools: &str, call_result: &str) -> McpServerConfig {
        McpServerConfig {
            name: name.to_string(),
            command: Some("sh".to_string()),
            args: vec!["-c".to_string(), mock_script(tools, call_result)],
            timeout_ms: Some(5000),
            description: Some(format!("{name} mock")),
            ..Default::default()
        }
    }

    fn mock_server(name: &str) -> McpServerConfig {
        mock_server_with(name, PING_TOOLS, PONG)
    }

    fn sh_available() -> bool {
        std::process::Command::new("sh")
            .arg("-c")
            .arg("exit 0")
            .status()
            .is_ok()
    }

    #[tokio::test]
    async fn empty_config_connects_nothing() {
        let manager = McpManager::connect_all(&McpConfig::default(), Path::new("."))
            .await
            .unwrap();
        assert_eq!(manager.client_count(), 0);
        assert!(manager.catalog().is_empty());
        assert!(manager.resolve("demo__add").is_none());
        manager.shutdown().await;
    }

    #[tokio::test]
    async fn catalog_qualifies_identical_tool_names() {
        if !sh_available() {
            return;
        }
        let config = McpConfig {
            servers: vec![mock_server("alpha"), mock_server("beta")],
        };
        let manager = McpManager::connect_all(&config, Path::new(".")).await.unwrap();

        let catalog = manager.catalog();
        let names: Vec<&str> = catalog.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["alpha__ping", "beta__ping"]);
        assert_eq!(catalog[0].description, "Ping");
        let summary = manager.server_summary();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].name, "alpha");
        assert_eq!(summary[0].description, Some("alpha mock"));
        assert_eq!(summary[1].tool_count, 1);

        for def in &catalog {
            let resolved = manager.resolve(&def.name).unwrap();
            assert_eq!(qualify(&resolved.server, &resolved.tool), def.name);
        }

        manager.shutdown().await;
    }

    #[tokio::test]
    async fn call_tool_routes_original_name() {
        if !sh_available() {
            return;
        }
        let config = McpConfig {
            servers: vec![mock_server("alpha")],
        };
        let manager = McpManager::connect_all(&config, Path::new(".")).await.unwrap();

        let tool = manager.resolve("alpha__ping").unwrap();
        assert_eq!(tool.tool, "ping");
        let output = manager
            .call_tool(&tool, serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(output, ToolOutput::text("pong"));

        manager.shutdown().await;
    }

    #[tokio::test]
    async fn error_flag_reaches_tool_output() {
        if !sh_available() {
            return;
        }
        let config = McpConfig {
            servers: vec![mock_server_with(
                "alpha",
                PING_TOOLS,
                r#"{"content":[{"type":"text","text":"no route to host"}],"isError":true}"#,
            )],
        };
        let manager = McpManager::connect_all(&config, Path::new(".")).await.unwrap();

        let tool = manager.resolve("alpha__ping").unwrap();
        let output = manager
            .call_tool(&tool, serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(output, ToolOutput::error("no route to host"));

        manager.shutdown().await;
    }

    #[tokio::test]
    async fn tools_with_unusable_names_are_not_published() {
        if !sh_available() {
            return;
        }
        let tools = r#"[{"name":"get.weather"},{"name":"ping"},{"name":"say hello"}]"#;
        let config = McpConfig {
            servers: vec![mock_server_with("alpha", tools, PONG)],
        };
        let manager = McpManager::connect_all(&config, Path::new(".")).await.unwrap();

        let names: Vec<String> = manager.catalog().into_iter().map(|t| t.name).collect();
        assert_eq!(names, ["alpha__ping"]);
        assert!(manager.resolve("alpha__get.weather").is_none());
        assert_eq!(manager.server_summary()[0].tool_count, 1);

        manager.shutdown().await;
    }

    #[tokio::test]
    async fn resolve_rejects_unknown_server_and_tool() {
        if !sh_available() {
            return;
        }
        let config = McpConfig {
            servers: vec![mock_server("alpha")],
        };
        let manager = McpManager::connect_all(&config, Path::new(".")).await.unwrap();

        assert!(manager.resolve("gamma__ping").is_none());
        assert!(manager.resolve("alpha__pong").is_none());
        assert!(manager.resolve("ping").is_none());

        manager.shutdown().await;
    }

    #[tokio::test]
    async fn unsupported_script_aborts_startup() {
        let config = McpConfig {
            servers: vec![McpServerConfig {
                name: "bad".to_string(),
                path: Some(PathBuf::from("server.rb")),
                ..Default::default()
            }],
        };
        match McpManager::connect_all(&config, Path::new(".")).await {
            Err(McpError::Connect { server, source }) => {
                assert_eq!(server, "bad");
                assert!(matches!(*source, McpError::UnsupportedScript { .. }));
            }
            Err(other) => panic!("Expected Connect error, got {other:?}"),
            Ok(_) => panic!("Expected startup to fail"),
        }
    }

    #[tokio::test]
    async fn later_failure_aborts_after_earlier_success() {
        if !sh_available() {
            return;
        }
        let config = McpConfig {
            servers: vec![
                mock_server("alpha"),
                McpServerConfig {
                    name: "ghost".to_string(),
                    command: Some("this_command_does_not_exist_xyz123".to_string()),
                    ..Default::default()
                },
                mock_server("never"),
            ],
        };
        match McpManager::connect_all(&config, Path::new(".")).await {
            Err(McpError::Connect { server, source }) => {
                assert_eq!(server, "ghost");
                assert!(matches!(*source, McpError::SpawnFailed { .. }));
            }
            Err(other) => panic!("Expected Connect error, got {other:?}"),
            Ok(_) => panic!("Expected startup to fail"),
        }
    }
}

//! Drives the built demo server through the real client stack.

use relay_mcp::{McpClient, McpConfig, McpManager, McpServerConfig};
use relay_types::{ToolError, ToolRouter};
use serde_json::json;
use std::path::Path;

fn demo_server(name: &str) -> McpServerConfig {
    McpServerConfig {
        name: name.to_string(),
        command: Some(env!("CARGO_BIN_EXE_relay-demo-server").to_string()),
        ..Default::default()
    }
}

fn cwd() -> &'static Path {
    Path::new(env!("CARGO_MANIFEST_DIR"))
}

#[tokio::test]
async fn handshake_discovers_tools() {
    let client = McpClient::connect(&demo_server("demo"), cwd()).await.unwrap();
    let names: Vec<&str> = client.tools().iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["add", "echo"]);
    assert_eq!(client.tools()[0].input_schema["required"], json!(["a", "b"]));
    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn call_add_and_echo() {
    let client = McpClient::connect(&demo_server("demo"), cwd()).await.unwrap();

    let result = client.call_tool("add", json!({"a": 2, "b": 3})).await.unwrap();
    assert!(!result.is_error);
    assert_eq!(relay_mcp::tool::render_content(&result.content), "5");

    let result = client
        .call_tool("echo", json!({"message": "hi"}))
        .await
        .unwrap();
    assert_eq!(
        relay_mcp::tool::render_content(&result.content),
        "Tool echo: hi"
    );

    client.shutdown().await.unwrap();
}

#[tokio::test]
async fn two_servers_share_tool_names() {
    let config = McpConfig {
        servers: vec![demo_server("alpha"), demo_server("beta")],
    };
    config.validate().unwrap();

    let manager = McpManager::connect_all(&config, cwd()).await.unwrap();
    assert_eq!(manager.client_count(), 2);

    let catalog = manager.catalog();
    let names: Vec<&str> = catalog.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["alpha__add", "alpha__echo", "beta__add", "beta__echo"]);

    for def in &catalog {
        let resolved = manager.resolve(&def.name).unwrap();
        assert_eq!(resolved.qualified_name, def.name);
    }

    let add = manager.resolve("beta__add").unwrap();
    assert_eq!(add.server, "beta");
    assert_eq!(add.tool, "add");
    let output = manager.call_tool(&add, json!({"a": 40, "b": 2})).await.unwrap();
    assert_eq!(output.text, "42");
    assert!(!output.is_error);

    assert!(manager.resolve("gamma__add").is_none());
    assert!(manager.resolve("alpha__subtract").is_none());

    manager.shutdown().await;
}

#[tokio::test]
async fn bad_arguments_surface_as_tool_error() {
    let config = McpConfig {
        servers: vec![demo_server("demo")],
    };
    let manager = McpManager::connect_all(&config, cwd()).await.unwrap();

    let add = manager.resolve("demo__add").unwrap();
    let err = manager
        .call_tool(&add, json!({"a": "two"}))
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::ExecutionFailed { ref server, ref tool, .. }
        if server == "demo" && tool == "add"));

    manager.shutdown().await;
}

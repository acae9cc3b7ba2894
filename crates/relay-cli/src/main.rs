//! Relay CLI: chat with a model that can call tools on MCP servers.

use anyhow::{Context, Result};
use clap::Parser;
use relay_api::AnthropicProvider;
use relay_config::{DOTENV_FILE, RelayConfig, SERVERS_FILE, load_dotenv};
use relay_core::{EXIT_KEYWORD, QueryProcessor, chat_loop};
use relay_mcp::McpManager;
use relay_types::ToolRouter;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// Reads `mcp-server.json` (and an optional `.env`) from the working
/// directory, starts every listed server, then answers queries from stdin
/// until `quit` or end of input.
#[derive(Parser)]
#[command(name = "relay", version, about)]
struct Cli {}

#[tokio::main]
async fn main() -> Result<()> {
    let _cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let dotenv = load_dotenv(Path::new(DOTENV_FILE));
    let config = RelayConfig::load(Path::new(SERVERS_FILE), &dotenv)
        .with_context(|| format!("Failed to load configuration ({SERVERS_FILE})"))?;

    let provider = AnthropicProvider::new(&config.api_key, &config.api_base_url)
        .context("Failed to create API client")?;

    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    let manager = McpManager::connect_all(&config.servers, &cwd)
        .await
        .context("Failed to connect to MCP servers")?;
    let manager = Arc::new(manager);

    let processor = QueryProcessor::new(
        Arc::new(provider),
        Arc::clone(&manager) as Arc<dyn ToolRouter>,
        config.model.clone(),
        config.max_tokens,
    );

    print_banner(&config, &manager);

    let result = chat_loop(
        &processor,
        io::stdin().lock(),
        &mut io::stdout(),
        &mut io::stderr(),
    )
    .await;

    drop(processor);
    match Arc::try_unwrap(manager) {
        Ok(manager) => manager.shutdown().await,
        Err(_) => tracing::warn!("MCP servers still in use at exit; leaving them to be killed"),
    }

    let answered = result.context("Chat session failed")?;
    tracing::debug!("Session ended after {answered} answered queries");
    Ok(())
}

fn print_banner(config: &RelayConfig, manager: &McpManager) {
    eprintln!(
        "relay v{} (model: {})",
        env!("CARGO_PKG_VERSION"),
        config.model
    );
    for server in manager.server_summary() {
        match server.description {
            Some(description) => eprintln!(
                "  {}: {} tools ({description})",
                server.name, server.tool_count
            ),
            None => eprintln!("  {}: {} tools", server.name, server.tool_count),
        }
    }
    eprintln!("Type your queries or '{EXIT_KEYWORD}' to exit.");
}

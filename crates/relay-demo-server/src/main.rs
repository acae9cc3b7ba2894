//! Relay demo server: a toy MCP tool server over stdio.
//!
//! Reads newline-delimited JSON-RPC from stdin and writes responses to
//! stdout. Logs go to stderr.

mod protocol;
mod server;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!(
        "{} {} listening on stdio",
        server::SERVER_NAME,
        server::SERVER_VERSION
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if line.trim().is_empty() {
            continue;
        }
        let Some(response) = server::handle_line(&line) else {
            continue;
        };
        let mut out = serde_json::to_string(&response)?;
        out.push('\n');
        stdout
            .write_all(out.as_bytes())
            .await
            .context("Failed to write stdout")?;
        stdout.flush().await?;
    }

    tracing::info!("stdin closed, exiting");
    Ok(())
}

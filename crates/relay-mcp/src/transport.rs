//! Stdio transport for MCP server communication.
//!
//! Spawns a child process and exchanges newline-delimited JSON-RPC messages
//! over its stdin/stdout. Requests are matched to responses by id.

use crate::config::LaunchCommand;
use crate::error::McpError;
use crate::jsonrpc::{JsonRpcNotification, JsonRpcRequest, JsonRpcResponse};
use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;

/// How long a server gets to exit after its stdin closes.
const GRACEFUL_EXIT: Duration = Duration::from_secs(5);

/// Requests awaiting a response. Once the server's stdout closes or becomes
/// unreadable no new entries are accepted and every waiting sender is dropped.
#[derive(Default)]
struct Pending {
    waiting: HashMap<u64, oneshot::Sender<JsonRpcResponse>>,
    closed: bool,
}

/// Async stdio transport for communicating with an MCP server process.
pub struct StdioTransport {
    next_id: AtomicU64,
    write_tx: mpsc::Sender<String>,
    pending: Arc<Mutex<Pending>>,
    reader_handle: JoinHandle<()>,
    writer_handle: JoinHandle<()>,
    child: Mutex<Child>,
    timeout_ms: Option<u64>,
}

impl StdioTransport {
    /// Spawn the server process and start background reader/writer tasks.
    pub fn spawn(
        server: &str,
        launch: &LaunchCommand,
        env: &HashMap<String, String>,
        timeout_ms: Option<u64>,
    ) -> Result<Self, McpError> {
        let mut child = Command::new(&launch.program)
            .args(&launch.args)
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| McpError::SpawnFailed {
                name: server.to_string(),
                command: launch.program.clone(),
                source: e,
            })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            return Err(McpError::Protocol(
                "child process stdio was not piped".to_string(),
            ));
        };

        let pending = Arc::new(Mutex::new(Pending::default()));

        let (write_tx, mut write_rx) = mpsc::channel::<String>(64);
        let writer_handle = tokio::spawn(async move {
            let mut stdin = stdin;
            while let Some(msg) = write_rx.recv().await {
                if stdin.write_all(msg.as_bytes()).await.is_err()
                    || stdin.write_all(b"\n").await.is_err()
                    || stdin.flush().await.is_err()
                {
                    break;
                }
            }
        });

        let pending_for_reader = Arc::clone(&pending);
        let server_name = server.to_string();
        let reader_handle = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        tracing::debug!("MCP server '{server_name}' closed its stdout");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to read from MCP server '{server_name}': {e}");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                let msg: JsonRpcResponse = match serde_json::from_str(&line) {
                    Ok(m) => m,
                    Err(e) => {
                        tracing::warn!("Unparsable message from '{server_name}': {e}: {line}");
                        continue;
                    }
                };
                if !msg.is_response() {
                    tracing::debug!(
                        "Ignoring server-initiated message from '{server_name}': {:?}",
                        msg.method
                    );
                    continue;
                }
                if let Some(id) = msg.id {
                    if let Some(tx) = pending_for_reader.lock().await.waiting.remove(&id) {
                        let _ = tx.send(msg);
                    }
                }
            }
            let mut pending = pending_for_reader.lock().await;
            pending.closed = true;
            pending.waiting.clear();
        });

        Ok(Self {
            next_id: AtomicU64::new(1),
            write_tx,
            pending,
            reader_handle,
            writer_handle,
            child: Mutex::new(child),
            timeout_ms,
        })
    }

    /// Send a JSON-RPC request and wait for the response.
    pub async fn send_request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<JsonRpcResponse, McpError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let serialized = serde_json::to_string(&JsonRpcRequest::new(id, method, params))?;

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            if pending.closed {
                return Err(McpError::ConnectionClosed);
            }
            pending.waiting.insert(id, tx);
        }

        tracing::debug!("-> {method} (id {id})");
        if self.write_tx.send(serialized).await.is_err() {
            self.pending.lock().await.waiting.remove(&id);
            return Err(McpError::ConnectionClosed);
        }

        let Some(timeout_ms) = self.timeout_ms else {
            return rx.await.map_err(|_| McpError::ConnectionClosed);
        };

        match tokio::time::timeout(Duration::from_millis(timeout_ms), rx).await {
            Ok(Ok(resp)) => Ok(resp),
            Ok(Err(_)) => Err(McpError::ConnectionClosed),
            Err(_) => {
                self.pending.lock().await.waiting.remove(&id);
                Err(McpError::Timeout {
                    method: method.to_string(),
                    timeout_ms,
                })
            }
        }
    }

    /// Send a JSON-RPC notification (fire-and-forget, no response expected).
    pub async fn send_notification(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<(), McpError> {
        let serialized = serde_json::to_string(&JsonRpcNotification::new(method, params))?;
        self.write_tx
            .send(serialized)
            .await
            .map_err(|_| McpError::ConnectionClosed)
    }

    /// Shut down: close stdin, wait briefly for exit, then kill.
    pub async fn shutdown(self) -> Result<(), McpError> {
        let Self {
            write_tx,
            reader_handle,
            writer_handle,
            child,
            ..
        } = self;
        let mut child = child.into_inner();

        // Dropping the writer task drops the child's stdin, which is its EOF.
        drop(write_tx);
        writer_handle.abort();
        let _ = writer_handle.await;

        let result = match tokio::time::timeout(GRACEFUL_EXIT, child.wait()).await {
            Ok(status) => status.map(|_| ()).map_err(McpError::from),
            Err(_) => child.kill().await.map_err(McpError::from),
        };

        reader_handle.abort();
        result
    }
}

//! Configuration types for MCP servers and launch-command resolution.

use crate::error::McpError;
use crate::tool::validate_server_name;
use relay_types::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Package runner recognised in the `command` field.
const PACKAGE_RUNNER: &str = "npx";

/// Top-level MCP configuration: servers in the order they are connected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct McpConfig {
    #[serde(default)]
    pub servers: Vec<McpServerConfig>,
}

/// Configuration for a single MCP server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct McpServerConfig {
    /// Unique name; becomes the prefix of every qualified tool name.
    pub name: String,
    /// `npx`, an interpreter (`node`, `python`, ...), or an executable.
    /// When absent the interpreter is inferred from the `path` extension.
    #[serde(default)]
    pub command: Option<String>,
    /// Script path, resolved against the working directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Extra arguments passed to the command.
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment variables to set for the server process.
    #[serde(default)]
    pub env: HashMap<String, String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Per-request timeout in milliseconds. No timeout when absent.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

/// A resolved program + argument list, ready to spawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl McpConfig {
    /// Check the invariants the tool catalog relies on: every server name
    /// qualifies unambiguously, names are unique, every launch resolves.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for (i, server) in self.servers.iter().enumerate() {
            let key = format!("servers[{i}].name");
            validate_server_name(&server.name)
                .map_err(|message| ConfigError::InvalidValue { key: key.clone(), message })?;
            if !seen.insert(server.name.as_str()) {
                return Err(ConfigError::InvalidValue {
                    key,
                    message: format!("duplicate server name '{}'", server.name),
                });
            }
            server
                .launch(Path::new("."))
                .map_err(|e| ConfigError::InvalidValue {
                    key: format!("servers[{i}]"),
                    message: e.to_string(),
                })?;
        }
        Ok(())
    }
}

impl McpServerConfig {
    /// Resolve the program and arguments used to start this server.
    ///
    /// Fails without touching the filesystem or spawning anything.
    pub fn launch(&self, cwd: &Path) -> Result<LaunchCommand, McpError> {
        let script = self.path.as_ref().map(|p| cwd.join(p));

        match self.command.as_deref() {
            Some(PACKAGE_RUNNER) => Ok(LaunchCommand {
                program: PACKAGE_RUNNER.to_string(),
                args: self.args.clone(),
            }),
            Some(command) => {
                let program = if command == "python" {
                    python_program()
                } else {
                    command
                };
                let mut args: Vec<String> = script
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect();
                args.extend(self.args.iter().cloned());
                Ok(LaunchCommand {
                    program: program.to_string(),
                    args,
                })
            }
            None => {
                let script = script.ok_or_else(|| McpError::MissingLaunch {
                    name: self.name.clone(),
                })?;
                let program = interpreter_for(&script).ok_or_else(|| {
                    McpError::UnsupportedScript {
                        name: self.name.clone(),
                        path: script.clone(),
                    }
                })?;
                let mut args = vec![script.display().to_string()];
                args.extend(self.args.iter().cloned());
                Ok(LaunchCommand {
                    program: program.to_string(),
                    args,
                })
            }
        }
    }
}

/// Interpreter for a script, chosen by file extension.
fn interpreter_for(script: &Path) -> Option<&'static str> {
    match script.extension().and_then(|e| e.to_str()) {
        Some("js" | "mjs" | "cjs") => Some("node"),
        Some("py") => Some(python_program()),
        _ => None,
    }
}

fn python_program() -> &'static str {
    if cfg!(windows) { "python" } else { "python3" }
}

//! Startup configuration for Relay.
//!
//! Two sources are combined into one [`RelayConfig`]:
//! - the server list, `mcp-server.json` in the working directory;
//! - API settings, env vars > `.env` > `~/.relay/config.toml` > defaults.
//!
//! The resolved value is passed explicitly to the API client and the
//! connection manager; nothing downstream reads the environment.

use relay_mcp::McpConfig;
use relay_types::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The server list file, relative to the working directory.
pub const SERVERS_FILE: &str = "mcp-server.json";

/// Optional `KEY=value` file, relative to the working directory.
pub const DOTENV_FILE: &str = ".env";

/// The default Anthropic API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.anthropic.com";

/// The default model to use.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5-20250929";

/// The default max tokens for a response.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Resolved configuration for a Relay session.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub api_base_url: String,
    pub servers: McpConfig,
}

/// Settings that can be read from the TOML settings file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub api: ApiSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSettings {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub base_url: Option<String>,
}

/// The API-related subset of [`RelayConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub api_base_url: String,
}

impl RelayConfig {
    /// Load configuration from the process environment, the `dotenv` pairs,
    /// the settings file and `servers_path`.
    ///
    /// Precedence for API settings (highest to lowest):
    /// 1. Environment variables
    /// 2. `.env` pairs
    /// 3. Settings file (`<config_dir>/config.toml`)
    /// 4. Defaults
    pub fn load(
        servers_path: &Path,
        dotenv: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let settings = load_settings_file(&config_dir().join("config.toml"));
        let env = layered_env(|key| std::env::var(key).ok(), dotenv);
        let api = resolve_api(settings, env)?;
        let servers = load_servers_file(servers_path)?;

        Ok(RelayConfig {
            api_key: api.api_key,
            model: api.model,
            max_tokens: api.max_tokens,
            api_base_url: api.api_base_url,
            servers,
        })
    }
}

/// Resolve API settings from a settings file and an environment lookup.
pub fn resolve_api(
    settings: SettingsFile,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ApiConfig, ConfigError> {
    let api_key = env("ANTHROPIC_API_KEY")
        .filter(|k| !k.is_empty())
        .or(settings.api.api_key)
        .ok_or_else(|| ConfigError::MissingKey {
            key: "api_key (set ANTHROPIC_API_KEY, add it to .env or to ~/.relay/config.toml)"
                .into(),
        })?;

    let model = env("RELAY_MODEL")
        .or(settings.api.model)
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let max_tokens = settings.api.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);

    let api_base_url = env("ANTHROPIC_API_BASE_URL")
        .or(settings.api.base_url)
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

    Ok(ApiConfig {
        api_key,
        model,
        max_tokens,
        api_base_url,
    })
}

/// Read `KEY=value` pairs from a dotenv file without touching the process
/// environment. A missing file yields no pairs; malformed lines are skipped.
pub fn load_dotenv(path: &Path) -> HashMap<String, String> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => return HashMap::new(),
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", path.display(), e);
            return HashMap::new();
        }
    };

    let pairs: HashMap<String, String> = iter
        .filter_map(|item| match item {
            Ok(pair) => Some(pair),
            Err(e) => {
                tracing::warn!("Skipping line in {}: {}", path.display(), e);
                None
            }
        })
        .collect();
    tracing::debug!("Loaded {} variable(s) from {}", pairs.len(), path.display());
    pairs
}

/// An env lookup that prefers non-empty `process` values and falls back to
/// `dotenv`.
pub fn layered_env<'a>(
    process: impl Fn(&str) -> Option<String> + 'a,
    dotenv: &'a HashMap<String, String>,
) -> impl Fn(&str) -> Option<String> + 'a {
    move |key| {
        process(key)
            .filter(|v| !v.is_empty())
            .or_else(|| dotenv.get(key).cloned())
    }
}

/// Read, parse and validate the server list. Any failure is fatal.
pub fn load_servers_file(path: &Path) -> Result<McpConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let config: McpConfig = serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    config.validate()?;
    tracing::debug!(
        "Loaded {} server(s) from {}",
        config.servers.len(),
        path.display()
    );
    Ok(config)
}

/// Get the Relay config directory path (~/.relay/).
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("RELAY_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".relay")
}

/// Load and parse a TOML settings file, returning defaults on any error.
fn load_settings_file(path: &Path) -> SettingsFile {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Failed to parse {}: {}", path.display(), e);
            SettingsFile::default()
        }),
        Err(_) => SettingsFile::default(),
    }
}

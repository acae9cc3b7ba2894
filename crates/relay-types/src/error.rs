//! Error hierarchy for Relay.

use thiserror::Error;

/// Top-level error for one query/response cycle.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),
}

/// Errors from the Anthropic Messages API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Server overloaded")]
    Overloaded,

    #[error("Server error: {status} {message}")]
    Server { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Request timeout")]
    Timeout,
}

/// Errors from invoking a tool on a tool server.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Tool '{tool}' on server '{server}' failed: {message}")]
    ExecutionFailed {
        server: String,
        tool: String,
        message: String,
    },
}

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    Read { path: String, message: String },

    #[error("Config file parse error at {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Missing required configuration: {key}")]
    MissingKey { key: String },

    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_error_wraps_api_error() {
        let err: RelayError = ApiError::Overloaded.into();
        assert_eq!(err.to_string(), "API error: Server overloaded");
    }

    #[test]
    fn relay_error_wraps_tool_error() {
        let err: RelayError = ToolError::UnknownTool {
            name: "demo__nope".into(),
        }
        .into();
        assert!(matches!(err, RelayError::Tool(ToolError::UnknownTool { .. })));
        assert!(err.to_string().starts_with("Tool error: "));
    }

    #[test]
    fn tool_error_names_server_and_tool() {
        let err = ToolError::ExecutionFailed {
            server: "demo".into(),
            tool: "add".into(),
            message: "broken pipe".into(),
        };
        assert_eq!(
            err.to_string(),
            "Tool 'add' on server 'demo' failed: broken pipe"
        );
    }

    #[test]
    fn config_error_invalid_value_display() {
        let err = ConfigError::InvalidValue {
            key: "servers[0].name".into(),
            message: "must not contain '__'".into(),
        };
        assert!(err.to_string().contains("servers[0].name"));
    }
}

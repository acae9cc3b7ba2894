//! The tool boundary: a flat catalog of invokable tools and their dispatch.

use std::future::Future;
use std::pin::Pin;

use crate::ToolDefinition;

/// A catalog entry resolved back to its owning server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTool {
    /// The qualified name the model used.
    pub qualified_name: String,
    /// Name of the server that advertised the tool.
    pub server: String,
    /// The tool's name as the server knows it.
    pub tool: String,
}

/// Result of invoking a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// The result rendered as text.
    pub text: String,
    /// Whether the server flagged the result as an error.
    pub is_error: bool,
}

impl ToolOutput {
    /// Create a successful text output.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    /// Create an error text output.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

/// Routes model-issued tool invocations to the servers that own them.
///
/// `catalog` and `resolve` are pure reads over state fixed at connect time;
/// only `call_tool` talks to a server.
pub trait ToolRouter: Send + Sync {
    /// Every invokable tool, in a stable order, under its qualified name.
    fn catalog(&self) -> Vec<ToolDefinition>;

    /// Map a qualified name back to its owning server, or `None`.
    fn resolve(&self, qualified_name: &str) -> Option<ResolvedTool>;

    /// Invoke a resolved tool with the given JSON arguments.
    fn call_tool<'a>(
        &'a self,
        tool: &'a ResolvedTool,
        arguments: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutput, crate::error::ToolError>> + Send + 'a>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_output_constructors() {
        assert!(!ToolOutput::text("3").is_error);
        assert!(ToolOutput::error("nope").is_error);
    }

    #[test]
    fn tool_router_is_dyn_compatible() {
        fn _accept(_r: &dyn ToolRouter) {}
    }
}

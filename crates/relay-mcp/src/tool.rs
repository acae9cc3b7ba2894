//! Qualified tool names and result rendering.
//!
//! A qualified name is `<server>__<tool>`. Server names are validated so that
//! they never contain `__` and never end in `_`; the first `__` in a qualified
//! name is therefore always the boundary, whatever the tool name contains.

use crate::client::McpToolContent;

/// Delimiter between server name and tool name.
pub const QUALIFIER: &str = "__";

/// Longest tool name the model API accepts.
pub const MAX_TOOL_NAME_LEN: usize = 64;

/// Build the catalog name for `tool` advertised by `server`.
pub fn qualify(server: &str, tool: &str) -> String {
    format!("{server}{QUALIFIER}{tool}")
}

/// Split a qualified name into `(server, tool)`.
pub fn split_qualified(qualified: &str) -> Option<(&str, &str)> {
    let (server, tool) = qualified.split_once(QUALIFIER)?;
    if server.is_empty() || tool.is_empty() {
        return None;
    }
    Some((server, tool))
}

/// Check that a server name keeps qualification reversible.
///
/// The model API restricts tool names to `[A-Za-z0-9_-]`, so the same
/// alphabet applies here.
pub fn validate_server_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("server name must not be empty".to_string());
    }
    if let Some(c) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(format!(
            "server name '{name}' contains '{c}'; only ASCII letters, digits, '-' and '_' are allowed"
        ));
    }
    if name.contains(QUALIFIER) {
        return Err(format!("server name '{name}' must not contain '{QUALIFIER}'"));
    }
    if name.ends_with('_') {
        return Err(format!("server name '{name}' must not end with '_'"));
    }
    Ok(())
}

/// Whether the model API accepts `name` as a tool name: 1 to
/// [`MAX_TOOL_NAME_LEN`] characters from `[A-Za-z0-9_-]`.
pub fn is_api_tool_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_TOOL_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Render tool result content as the text appended to the conversation.
pub fn render_content(content: &[McpToolContent]) -> String {
    content
        .iter()
        .map(|c| match c {
            McpToolContent::Text { text } => text.clone(),
            McpToolContent::Image { mime_type, .. } => format!("[image: {mime_type}]"),
            McpToolContent::Resource { resource } => resource
                .text
                .clone()
                .unwrap_or_else(|| format!("[resource: {}]", resource.uri)),
            McpToolContent::Unsupported => "[unsupported content]".to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

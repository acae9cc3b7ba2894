//! The query processor: one user query through the model and its tools.

use relay_types::provider::Provider;
use relay_types::{
    ContentBlock, CreateMessageRequest, Message, RelayError, ToolDefinition, ToolRouter,
};
use std::sync::Arc;

/// Longest tool result echoed to the debug log.
const LOG_PREVIEW_CHARS: usize = 200;

/// Sent in place of a tool result that rendered to blank text; the model API
/// rejects empty text blocks.
pub const EMPTY_TOOL_RESULT: &str = "(no output)";

/// Marker recorded in the answer when a tool is invoked.
pub fn tool_called_marker(name: &str, arguments: &serde_json::Value) -> String {
    format!("[Calling tool {name} with args {arguments}]")
}

/// Marker recorded in the answer when the model names a tool nobody owns.
pub fn unresolved_marker(name: &str) -> String {
    format!("[Error: tool {name} not found]")
}

/// Drives a single query to completion.
///
/// Each call to [`QueryProcessor::process`] starts a fresh conversation; no
/// state carries over between queries.
pub struct QueryProcessor {
    provider: Arc<dyn Provider>,
    router: Arc<dyn ToolRouter>,
    model: String,
    max_tokens: u32,
    catalog: Vec<ToolDefinition>,
}

impl QueryProcessor {
    /// The tool catalog is captured here; the router's servers are fixed
    /// after connect, so it never goes stale.
    pub fn new(
        provider: Arc<dyn Provider>,
        router: Arc<dyn ToolRouter>,
        model: String,
        max_tokens: u32,
    ) -> Self {
        let catalog = router.catalog();
        Self {
            provider,
            router,
            model,
            max_tokens,
            catalog,
        }
    }

    /// Run one query and return the answer text.
    ///
    /// The first model call offers the full tool catalog. Blocks of the reply
    /// are handled in order: text is copied to the answer; each resolvable
    /// tool call is invoked, its result appended to the conversation as a user
    /// message, and the model asked once more (without tools) to follow up on
    /// it. An unresolvable tool call only leaves an error marker. Any model or
    /// tool failure aborts the whole query.
    pub async fn process(&self, query: &str) -> Result<String, RelayError> {
        let mut messages = vec![Message::user_text(query)];
        let tools = if self.catalog.is_empty() {
            None
        } else {
            Some(self.catalog.clone())
        };

        let response = self.ask(&mut messages, tools).await?;
        let mut answer: Vec<String> = Vec::new();

        for block in response {
            match block {
                ContentBlock::Text { text } => answer.push(text),
                ContentBlock::ToolUse { name, input, .. } => {
                    let Some(tool) = self.router.resolve(&name) else {
                        tracing::warn!("Model requested unknown tool '{name}'");
                        answer.push(unresolved_marker(&name));
                        continue;
                    };

                    tracing::info!("Calling tool {} on server '{}'", tool.tool, tool.server);
                    let marker = tool_called_marker(&name, &input);
                    let output = self.router.call_tool(&tool, input).await?;
                    tracing::debug!(
                        "Tool {name} returned{}: {}",
                        if output.is_error { " an error" } else { "" },
                        preview(&output.text)
                    );
                    answer.push(marker);

                    let result_text = if output.text.trim().is_empty() {
                        EMPTY_TOOL_RESULT.to_string()
                    } else {
                        output.text
                    };
                    messages.push(Message::user_text(result_text));

                    let follow_up = self.ask(&mut messages, None).await?;
                    let narration = follow_up
                        .first()
                        .and_then(ContentBlock::as_text)
                        .unwrap_or_default()
                        .to_string();
                    answer.push(narration);
                }
                ContentBlock::Unsupported => {
                    tracing::debug!("Skipping unsupported content block");
                }
            }
        }

        Ok(answer.join("\n"))
    }

    /// Send the conversation so far and return the reply's content blocks.
    async fn ask(
        &self,
        messages: &mut Vec<Message>,
        tools: Option<Vec<ToolDefinition>>,
    ) -> Result<Vec<ContentBlock>, RelayError> {
        let mut request = CreateMessageRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: std::mem::take(messages),
            tools,
        };

        tracing::debug!(
            "Asking {} ({} messages, {} tools)",
            self.provider.name(),
            request.messages.len(),
            request.tools.as_ref().map_or(0, Vec::len)
        );
        let result = self.provider.create_message(&request).await;

        // Restore messages without cloning the history
        *messages = std::mem::take(&mut request.messages);

        Ok(result?.content)
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() <= LOG_PREVIEW_CHARS {
        text.to_string()
    } else {
        let head: String = text.chars().take(LOG_PREVIEW_CHARS).collect();
        format!("{head}...")
    }
}

//! Query orchestration and the chat session loop for Relay.

mod chat;
mod query;

pub use chat::{EXIT_KEYWORD, chat_loop, is_exit};
pub use query::{EMPTY_TOOL_RESULT, QueryProcessor, tool_called_marker, unresolved_marker};

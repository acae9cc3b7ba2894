//! Anthropic Messages API client for Relay.

mod client;
mod provider;

pub use client::ApiClient;
pub use provider::AnthropicProvider;

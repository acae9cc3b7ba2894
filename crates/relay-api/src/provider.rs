//! Anthropic Messages API provider implementation.

use crate::client::ApiClient;
use relay_types::provider::Provider;
use relay_types::{ApiError, CreateMessageRequest, CreateMessageResponse};
use std::future::Future;
use std::pin::Pin;

/// Anthropic Messages API provider.
///
/// Wraps `ApiClient` and implements the `Provider` trait.
#[derive(Clone)]
pub struct AnthropicProvider {
    client: ApiClient,
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, ApiError> {
        Ok(Self {
            client: ApiClient::new(api_key, base_url)?,
        })
    }
}

impl Provider for AnthropicProvider {
    fn create_message<'a>(
        &'a self,
        request: &'a CreateMessageRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CreateMessageResponse, ApiError>> + Send + 'a>> {
        Box::pin(self.client.create_message(request))
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

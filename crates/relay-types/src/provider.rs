//! Provider trait for the language-model boundary.

use crate::{ApiError, CreateMessageRequest, CreateMessageResponse};
use std::future::Future;
use std::pin::Pin;

/// Trait for LLM API providers.
///
/// One request (conversation plus optional tool catalog) yields one complete
/// response of ordered content blocks. Dyn-compatible so the query processor
/// works with `Arc<dyn Provider>`.
pub trait Provider: Send + Sync {
    /// Send a message request and wait for the full response.
    fn create_message<'a>(
        &'a self,
        request: &'a CreateMessageRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CreateMessageResponse, ApiError>> + Send + 'a>>;

    /// Provider name for logging/display (e.g., "anthropic").
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn provider_is_dyn_compatible() {
        fn _accept(_p: &dyn Provider) {}
    }

    #[test]
    fn arc_provider_is_send_sync() {
        fn _assert_send_sync<T: Send + Sync>() {}
        _assert_send_sync::<Arc<dyn Provider>>();
    }
}

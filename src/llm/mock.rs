//! Scriptable chat provider for tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::ChatProvider;
use super::error::LlmError;
use super::types::ChatRequest;

type Responder = dyn Fn(&ChatRequest) -> Result<String, LlmError> + Send + Sync;

/// Answers every request through a closure and records what it was asked.
pub struct MockChatProvider {
    enabled: bool,
    responder: Arc<Responder>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockChatProvider {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&ChatRequest) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        Self {
            enabled: true,
            responder: Arc::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Always replies with `reply`.
    pub fn replying(reply: impl Into<String>) -> Self {
        let reply = reply.into();
        Self::new(move |_| Ok(reply.clone()))
    }

    /// A provider with no key configured.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(|_| Err(LlmError::ProviderUnavailable))
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl ChatProvider for MockChatProvider {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn complete(&self, request: ChatRequest) -> Result<String, LlmError> {
        self.requests.lock().push(request.clone());
        if !self.enabled {
            return Err(LlmError::ProviderUnavailable);
        }
        (self.responder)(&request)
    }
}

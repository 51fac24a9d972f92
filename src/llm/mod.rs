//! Chat-completion provider used as a scoring oracle.
//!
//! Every reply is treated as untrusted input: callers extract a JSON object
//! with [`json::extract_object`] and coerce each field into a typed schema,
//! falling back to documented defaults instead of erroring.

pub mod client;
mod error;
pub mod json;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod types;

#[cfg(test)]
mod tests;

use async_trait::async_trait;

pub use client::{ChatConfig, OpenAiChatClient};
pub use error::LlmError;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockChatProvider;
pub use types::{ChatMessage, ChatRequest, ContentPart, MessageContent, ModelPurpose, Role};

#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// `false` when no provider key is configured.
    fn is_enabled(&self) -> bool;

    /// Returns the raw text of the first completion choice.
    async fn complete(&self, request: ChatRequest) -> Result<String, LlmError>;
}

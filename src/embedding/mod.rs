//! Text embeddings for items.
//!
//! - [`client`] talks to an OpenAI-compatible `/embeddings` endpoint with retries.
//! - [`text`] flattens an item into the single string that gets embedded.

pub mod client;
mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod text;


use async_trait::async_trait;

pub use client::{EmbeddingConfig, OpenAiEmbedder};
pub use error::EmbeddingError;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEmbedder;
pub use text::embedding_text;

/// Turns text into a dense vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// `false` when no provider key is configured; callers treat the
    /// vector path as disabled rather than failing.
    fn is_enabled(&self) -> bool;

    /// Embeds a single consolidated description.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

//! Item vector index backed by Qdrant.

pub mod client;
mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod model;


use async_trait::async_trait;

pub use client::QdrantItemIndex;
pub use error::VectorDbError;
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockItemIndex, cosine_similarity};
pub use model::{IndexedItem, SimilarItem, SimilarityQuery};

pub const DEFAULT_COLLECTION_NAME: &str = "reclaim_items";

/// Similarity search over item embeddings.
///
/// Payload filtering (status, owner, active flag) happens inside the index so
/// the returned hits are already restricted to eligible candidates.
#[async_trait]
pub trait ItemIndex: Send + Sync {
    /// Creates the backing collection if it does not exist yet.
    async fn ensure_collection(&self) -> Result<(), VectorDbError>;

    /// Inserts or replaces the point for `item.item_id`.
    async fn upsert_item(&self, item: IndexedItem) -> Result<(), VectorDbError>;

    /// Returns hits ordered by descending similarity.
    async fn search_similar(
        &self,
        query: SimilarityQuery,
    ) -> Result<Vec<SimilarItem>, VectorDbError>;
}

use thiserror::Error;
use uuid::Uuid;

use crate::llm::LlmError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("claim not found: {claim_id}")]
    ClaimNotFound { claim_id: Uuid },

    #[error("item {item_id} for claim {claim_id} not found")]
    ItemNotFound { claim_id: Uuid, item_id: Uuid },

    /// The provider could not be reached; the job is retried later.
    #[error("language model request failed: {0}")]
    Provider(#[from] LlmError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

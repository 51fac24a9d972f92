use thiserror::Error;
use uuid::Uuid;

use crate::model::ClaimStatus;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("item not found: {item_id}")]
    ItemNotFound { item_id: Uuid },

    #[error("claim not found: {claim_id}")]
    ClaimNotFound { claim_id: Uuid },

    #[error("match not found: {match_id}")]
    MatchNotFound { match_id: Uuid },

    #[error("invalid claim: {reason}")]
    InvalidClaim { reason: String },

    #[error("claim {claim_id} was already {status:?}")]
    AlreadyReviewed { claim_id: Uuid, status: ClaimStatus },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

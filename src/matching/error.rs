use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum MatchingError {
    #[error("item not found: {item_id}")]
    ItemNotFound { item_id: Uuid },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

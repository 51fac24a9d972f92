use thiserror::Error;

use crate::matching::MatchingError;
use crate::store::StoreError;
use crate::verification::VerificationError;

#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Matching(#[from] MatchingError),

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error("job bookkeeping failed: {0}")]
    Store(#[from] StoreError),
}

impl JobError {
    /// Missing target rows will not appear on a retry; everything else might.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            JobError::Matching(MatchingError::ItemNotFound { .. })
                | JobError::Verification(
                    VerificationError::ClaimNotFound { .. }
                        | VerificationError::ItemNotFound { .. }
                )
        )
    }
}

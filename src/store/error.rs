use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
/// Errors returned by store operations.
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    /// The endpoint answered with a non-success status.
    #[error("store request to '{table}' failed with HTTP {status}: {body}")]
    Http {
        table: String,
        status: u16,
        body: String,
    },

    /// The request never completed.
    #[error("store request failed: {reason}")]
    Request { reason: String },

    #[error("failed to decode '{table}' rows: {reason}")]
    Decode { table: String, reason: String },

    /// A conditional write lost every race.
    #[error("concurrent updates to {entity} {id} did not settle after {attempts} attempts")]
    Conflict {
        entity: &'static str,
        id: Uuid,
        attempts: u32,
    },

    #[error("invalid store configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Writes are rejected (used by the in-memory store's fault injection).
    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::Request {
            reason: e.to_string(),
        }
    }
}

/// Convenience result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

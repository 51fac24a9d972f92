use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// No API key configured. Callers treat this as "feature disabled".
    #[error("embedding provider not configured")]
    ProviderUnavailable,

    #[error("embedding provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("embedding request failed: {reason}")]
    Request { reason: String },

    #[error("malformed embedding response: {reason}")]
    MalformedResponse { reason: String },

    #[error("embedding failed after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

impl EmbeddingError {
    /// Transient failures are retried by the client.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EmbeddingError::Http { .. } | EmbeddingError::Request { .. }
        )
    }
}

impl From<reqwest::Error> for EmbeddingError {
    fn from(err: reqwest::Error) -> Self {
        EmbeddingError::Request {
            reason: err.to_string(),
        }
    }
}

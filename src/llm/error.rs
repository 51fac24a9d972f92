use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("language model provider not configured")]
    ProviderUnavailable,

    #[error("model '{model}' returned HTTP {status}: {body}")]
    Http {
        model: String,
        status: u16,
        body: String,
    },

    #[error("chat request failed: {reason}")]
    Request { reason: String },

    #[error("malformed completion: {reason}")]
    MalformedResponse { reason: String },
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Request {
            reason: err.to_string(),
        }
    }
}

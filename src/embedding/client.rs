use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::Embedder;
use super::error::EmbeddingError;
use crate::constants::{EMBEDDING_BACKOFF_UNIT, EMBEDDING_MAX_ATTEMPTS};

/// Default OpenAI-compatible API root.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    /// Provider key; `None` (or empty) disables the client.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_attempts: u32,
    /// Attempt `n` sleeps `n * backoff_unit` before the next try.
    pub backoff_unit: Duration,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            max_attempts: EMBEDDING_MAX_ATTEMPTS,
            backoff_unit: EMBEDDING_BACKOFF_UNIT,
        }
    }
}

impl EmbeddingConfig {
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    fn key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: [&'a str; 1],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

/// Client for an OpenAI-compatible `/embeddings` endpoint.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    http: reqwest::Client,
    config: EmbeddingConfig,
}

impl std::fmt::Debug for OpenAiEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiEmbedder")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl OpenAiEmbedder {
    pub fn new(config: EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &EmbeddingConfig {
        &self.config
    }

    async fn request_once(&self, key: &str, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!("{}/embeddings", self.config.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .bearer_auth(key)
            .json(&EmbeddingRequest {
                model: &self.config.model,
                input: [text],
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbeddingResponse =
            response
                .json()
                .await
                .map_err(|e| EmbeddingError::MalformedResponse {
                    reason: e.to_string(),
                })?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| EmbeddingError::MalformedResponse {
                reason: "response contained no embedding".to_string(),
            })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn is_enabled(&self) -> bool {
        self.config.key().is_some()
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let key = self.config.key().ok_or(EmbeddingError::ProviderUnavailable)?;
        let max_attempts = self.config.max_attempts.max(1);

        let mut last_error = String::new();
        for attempt in 1..=max_attempts {
            match self.request_once(key, text).await {
                Ok(vector) => {
                    debug!(attempt, dim = vector.len(), "Embedding generated");
                    return Ok(vector);
                }
                Err(e) if e.is_transient() => {
                    warn!(attempt, max_attempts, error = %e, "Embedding attempt failed");
                    last_error = e.to_string();
                    if attempt < max_attempts {
                        tokio::time::sleep(self.config.backoff_unit * attempt).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(EmbeddingError::RetriesExhausted {
            attempts: max_attempts,
            last_error,
        })
    }
}

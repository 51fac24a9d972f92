use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::ChatProvider;
use super::error::LlmError;
use super::types::{ChatMessage, ChatRequest, ModelPurpose};
use crate::embedding::client::DEFAULT_OPENAI_BASE_URL;

pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_FALLBACK_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_VISION_MODEL: &str = "gpt-4o";
pub const DEFAULT_VISION_FALLBACK_MODEL: &str = "gpt-4o-mini";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub fallback_model: Option<String>,
    pub vision_model: String,
    pub vision_fallback_model: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_CHAT_MODEL.to_string(),
            fallback_model: Some(DEFAULT_FALLBACK_MODEL.to_string()),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            vision_fallback_model: Some(DEFAULT_VISION_FALLBACK_MODEL.to_string()),
        }
    }
}

impl ChatConfig {
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_models(mut self, model: impl Into<String>, fallback: Option<String>) -> Self {
        self.model = model.into();
        self.fallback_model = fallback;
        self
    }

    fn key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Primary model followed by at most one fallback.
    pub fn models_for(&self, purpose: ModelPurpose) -> Vec<&str> {
        let (primary, fallback) = match purpose {
            ModelPurpose::Text => (&self.model, &self.fallback_model),
            ModelPurpose::Vision => (&self.vision_model, &self.vision_fallback_model),
        };
        let mut models = vec![primary.as_str()];
        if let Some(fallback) = fallback.as_deref()
            && fallback != primary.as_str()
            && !fallback.trim().is_empty()
        {
            models.push(fallback);
        }
        models
    }
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
///
/// A failed call is retried once against the configured fallback model; no
/// other retries happen here.
#[derive(Clone)]
pub struct OpenAiChatClient {
    http: reqwest::Client,
    config: ChatConfig,
}

impl std::fmt::Debug for OpenAiChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiChatClient")
            .field("base_url", &self.config.base_url)
            .field("model", &self.config.model)
            .field("fallback_model", &self.config.fallback_model)
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl OpenAiChatClient {
    pub fn new(config: ChatConfig) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    async fn complete_with(
        &self,
        key: &str,
        model: &str,
        request: &ChatRequest,
    ) -> Result<String, LlmError> {
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let body = CompletionRequest {
            model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request
                .json_mode
                .then_some(ResponseFormat { kind: "json_object" }),
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Http {
                model: model.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionResponse =
            response
                .json()
                .await
                .map_err(|e| LlmError::MalformedResponse {
                    reason: e.to_string(),
                })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| LlmError::MalformedResponse {
                reason: "completion had no content".to_string(),
            })
    }
}

#[async_trait]
impl ChatProvider for OpenAiChatClient {
    fn is_enabled(&self) -> bool {
        self.config.key().is_some()
    }

    async fn complete(&self, request: ChatRequest) -> Result<String, LlmError> {
        let key = self.config.key().ok_or(LlmError::ProviderUnavailable)?;
        let models = self.config.models_for(request.purpose);

        let mut last_error = LlmError::ProviderUnavailable;
        for model in models {
            match self.complete_with(key, model, &request).await {
                Ok(content) => {
                    debug!(model, chars = content.len(), "Completion received");
                    return Ok(content);
                }
                Err(e) => {
                    warn!(model, error = %e, "Completion failed");
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }
}

//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `RECLAIM_*` environment
//! variables; the provider key also falls back to `OPENAI_API_KEY`.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::DEFAULT_EMBEDDING_DIM;
use crate::embedding::EmbeddingConfig;
use crate::embedding::client::{DEFAULT_EMBEDDING_MODEL, DEFAULT_OPENAI_BASE_URL};
use crate::jobs::WorkerConfig;
use crate::jobs::worker::DEFAULT_POLL_INTERVAL;
use crate::llm::ChatConfig;
use crate::llm::client::{DEFAULT_CHAT_MODEL, DEFAULT_FALLBACK_MODEL, DEFAULT_VISION_MODEL};
use crate::matching::MatchingConfig;
use crate::model::Confidence;
use crate::store::RestStoreConfig;
use crate::vectordb::DEFAULT_COLLECTION_NAME;

/// Server configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `RECLAIM_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// OpenAI-compatible API root shared by embeddings and chat.
    pub openai_base_url: String,

    /// Provider key; `None` disables every AI step.
    pub openai_api_key: Option<String>,

    pub embedding_model: String,
    pub embedding_dim: u64,
    pub chat_model: String,
    pub chat_fallback_model: Option<String>,
    pub vision_model: String,

    /// Qdrant endpoint; `None` leaves only the recency scan for retrieval.
    pub qdrant_url: Option<String>,
    pub qdrant_api_key: Option<String>,
    pub qdrant_collection: String,

    /// PostgREST root; `None` runs on the in-memory store.
    pub store_url: Option<String>,
    pub store_key: Option<String>,

    pub worker_poll_interval: Duration,
    pub job_max_attempts: u32,

    pub matching: MatchingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openai_api_key: None,
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            chat_fallback_model: Some(DEFAULT_FALLBACK_MODEL.to_string()),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            qdrant_url: None,
            qdrant_api_key: None,
            qdrant_collection: DEFAULT_COLLECTION_NAME.to_string(),
            store_url: None,
            store_key: None,
            worker_poll_interval: DEFAULT_POLL_INTERVAL,
            job_max_attempts: WorkerConfig::default().max_attempts,
            matching: MatchingConfig::default(),
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "RECLAIM_PORT";
    const ENV_BIND_ADDR: &'static str = "RECLAIM_BIND_ADDR";
    const ENV_OPENAI_BASE_URL: &'static str = "RECLAIM_OPENAI_BASE_URL";
    const ENV_OPENAI_API_KEY: &'static str = "RECLAIM_OPENAI_API_KEY";
    const ENV_OPENAI_API_KEY_FALLBACK: &'static str = "OPENAI_API_KEY";
    const ENV_EMBEDDING_MODEL: &'static str = "RECLAIM_EMBEDDING_MODEL";
    const ENV_EMBEDDING_DIM: &'static str = "RECLAIM_EMBEDDING_DIM";
    const ENV_CHAT_MODEL: &'static str = "RECLAIM_CHAT_MODEL";
    const ENV_CHAT_FALLBACK_MODEL: &'static str = "RECLAIM_CHAT_FALLBACK_MODEL";
    const ENV_VISION_MODEL: &'static str = "RECLAIM_VISION_MODEL";
    const ENV_QDRANT_URL: &'static str = "RECLAIM_QDRANT_URL";
    const ENV_QDRANT_API_KEY: &'static str = "RECLAIM_QDRANT_API_KEY";
    const ENV_QDRANT_COLLECTION: &'static str = "RECLAIM_QDRANT_COLLECTION";
    const ENV_STORE_URL: &'static str = "RECLAIM_STORE_URL";
    const ENV_STORE_KEY: &'static str = "RECLAIM_STORE_KEY";
    const ENV_WORKER_POLL_MS: &'static str = "RECLAIM_WORKER_POLL_MS";
    const ENV_JOB_MAX_ATTEMPTS: &'static str = "RECLAIM_JOB_MAX_ATTEMPTS";
    const ENV_MIN_MATCH_CONFIDENCE: &'static str = "RECLAIM_MIN_MATCH_CONFIDENCE";
    const ENV_MAX_MATCHES: &'static str = "RECLAIM_MAX_MATCHES";
    const ENV_SIMILARITY_THRESHOLD: &'static str = "RECLAIM_SIMILARITY_THRESHOLD";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let matching = MatchingConfig {
            min_confidence: Confidence::new(Self::parse_from_env(
                Self::ENV_MIN_MATCH_CONFIDENCE,
                defaults.matching.min_confidence.value(),
            )?),
            max_matches: Self::parse_from_env(Self::ENV_MAX_MATCHES, defaults.matching.max_matches)?,
            similarity_threshold: Self::parse_from_env(
                Self::ENV_SIMILARITY_THRESHOLD,
                defaults.matching.similarity_threshold,
            )?,
            ..defaults.matching.clone()
        };

        Ok(Self {
            port: Self::parse_port_from_env(defaults.port)?,
            bind_addr: Self::parse_bind_addr_from_env(defaults.bind_addr)?,
            openai_base_url: Self::parse_string_from_env(
                Self::ENV_OPENAI_BASE_URL,
                defaults.openai_base_url,
            ),
            openai_api_key: Self::parse_optional_from_env(Self::ENV_OPENAI_API_KEY)
                .or_else(|| Self::parse_optional_from_env(Self::ENV_OPENAI_API_KEY_FALLBACK)),
            embedding_model: Self::parse_string_from_env(
                Self::ENV_EMBEDDING_MODEL,
                defaults.embedding_model,
            ),
            embedding_dim: Self::parse_from_env(Self::ENV_EMBEDDING_DIM, defaults.embedding_dim)?,
            chat_model: Self::parse_string_from_env(Self::ENV_CHAT_MODEL, defaults.chat_model),
            chat_fallback_model: Self::parse_optional_from_env(Self::ENV_CHAT_FALLBACK_MODEL)
                .or(defaults.chat_fallback_model),
            vision_model: Self::parse_string_from_env(Self::ENV_VISION_MODEL, defaults.vision_model),
            qdrant_url: Self::parse_optional_from_env(Self::ENV_QDRANT_URL),
            qdrant_api_key: Self::parse_optional_from_env(Self::ENV_QDRANT_API_KEY),
            qdrant_collection: Self::parse_string_from_env(
                Self::ENV_QDRANT_COLLECTION,
                defaults.qdrant_collection,
            ),
            store_url: Self::parse_optional_from_env(Self::ENV_STORE_URL),
            store_key: Self::parse_optional_from_env(Self::ENV_STORE_KEY),
            worker_poll_interval: Duration::from_millis(Self::parse_from_env(
                Self::ENV_WORKER_POLL_MS,
                defaults.worker_poll_interval.as_millis() as u64,
            )?),
            job_max_attempts: Self::parse_from_env(
                Self::ENV_JOB_MAX_ATTEMPTS,
                defaults.job_max_attempts,
            )?,
            matching,
        })
    }

    /// Checks cross-field invariants and URL shapes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::check_url(Self::ENV_OPENAI_BASE_URL, &self.openai_base_url)?;
        if let Some(url) = &self.qdrant_url {
            Self::check_url(Self::ENV_QDRANT_URL, url)?;
        }
        if let Some(url) = &self.store_url {
            Self::check_url(Self::ENV_STORE_URL, url)?;
            if self.store_key.is_none() {
                return Err(ConfigError::MissingEnvVar {
                    name: Self::ENV_STORE_KEY,
                });
            }
        }

        if self.embedding_dim == 0 {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_EMBEDDING_DIM,
                value: self.embedding_dim.to_string(),
                reason: "must be positive",
            });
        }
        if self.worker_poll_interval.is_zero() {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_WORKER_POLL_MS,
                value: "0".to_string(),
                reason: "must be positive",
            });
        }
        if self.job_max_attempts == 0 {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_JOB_MAX_ATTEMPTS,
                value: "0".to_string(),
                reason: "must be at least 1",
            });
        }
        if self.matching.max_matches == 0 {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_MAX_MATCHES,
                value: "0".to_string(),
                reason: "must be at least 1",
            });
        }
        let threshold = self.matching.similarity_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::OutOfRange {
                name: Self::ENV_SIMILARITY_THRESHOLD,
                value: threshold.to_string(),
                reason: "must be between 0 and 1",
            });
        }
        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    pub fn embedding_config(&self) -> EmbeddingConfig {
        EmbeddingConfig {
            api_key: self.openai_api_key.clone(),
            base_url: self.openai_base_url.clone(),
            model: self.embedding_model.clone(),
            ..Default::default()
        }
    }

    pub fn chat_config(&self) -> ChatConfig {
        ChatConfig {
            api_key: self.openai_api_key.clone(),
            base_url: self.openai_base_url.clone(),
            model: self.chat_model.clone(),
            fallback_model: self.chat_fallback_model.clone(),
            vision_model: self.vision_model.clone(),
            ..Default::default()
        }
    }

    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            poll_interval: self.worker_poll_interval,
            max_attempts: self.job_max_attempts,
            ..Default::default()
        }
    }

    /// `Some` when both the PostgREST URL and key are set.
    pub fn store_config(&self) -> Option<RestStoreConfig> {
        match (&self.store_url, &self.store_key) {
            (Some(url), Some(key)) => Some(RestStoreConfig::new(url, key)),
            _ => None,
        }
    }

    fn check_url(name: &'static str, value: &str) -> Result<(), ConfigError> {
        if value.starts_with("http://") || value.starts_with("https://") {
            Ok(())
        } else {
            Err(ConfigError::InvalidUrl {
                name,
                value: value.to_string(),
            })
        }
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_optional_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        Self::parse_optional_from_env(var_name).unwrap_or(default)
    }

    fn parse_from_env<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
        match Self::parse_optional_from_env(name) {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidNumber { name, value }),
            None => Ok(default),
        }
    }
}

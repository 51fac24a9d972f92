//! Deterministic embedder for tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::Embedder;
use super::error::EmbeddingError;

/// Returns the vector of the first rule whose needle occurs in the text.
pub struct MockEmbedder {
    enabled: bool,
    failing: bool,
    rules: Vec<(String, Vec<f32>)>,
    default_vector: Vec<f32>,
    calls: AtomicUsize,
    inputs: Mutex<Vec<String>>,
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self {
            enabled: true,
            failing: false,
            rules: Vec::new(),
            default_vector: vec![0.0, 0.0, 1.0],
            calls: AtomicUsize::new(0),
            inputs: Mutex::new(Vec::new()),
        }
    }

    /// An embedder with no provider key.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new()
        }
    }

    /// An enabled embedder whose every call fails transiently.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::new()
        }
    }

    pub fn with_rule(mut self, needle: impl Into<String>, vector: Vec<f32>) -> Self {
        self.rules.push((needle.into(), vector));
        self
    }

    pub fn with_default_vector(mut self, vector: Vec<f32>) -> Self {
        self.default_vector = vector;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().clone()
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    fn is_enabled(&self) -> bool {
        self.enabled
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inputs.lock().push(text.to_string());

        if !self.enabled {
            return Err(EmbeddingError::ProviderUnavailable);
        }
        if self.failing {
            return Err(EmbeddingError::RetriesExhausted {
                attempts: 3,
                last_error: "mock provider down".to_string(),
            });
        }

        Ok(self
            .rules
            .iter()
            .find(|(needle, _)| text.contains(needle.as_str()))
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| self.default_vector.clone()))
    }
}

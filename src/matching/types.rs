use crate::constants::{
    DEFAULT_MAX_MATCHES, DEFAULT_SIMILARITY_THRESHOLD, FALLBACK_CANDIDATE_LIMIT,
    MIN_MATCH_CONFIDENCE, VECTOR_CANDIDATE_LIMIT,
};
use crate::model::{Confidence, Item};

#[derive(Debug, Clone, PartialEq)]
pub struct MatchingConfig {
    /// Scored matches below this are dropped.
    pub min_confidence: Confidence,
    pub max_matches: usize,
    /// Minimum cosine similarity for vector candidates (0-1).
    pub similarity_threshold: f32,
    pub vector_limit: u64,
    pub fallback_limit: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_confidence: Confidence::new(MIN_MATCH_CONFIDENCE),
            max_matches: DEFAULT_MAX_MATCHES,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            vector_limit: VECTOR_CANDIDATE_LIMIT,
            fallback_limit: FALLBACK_CANDIDATE_LIMIT,
        }
    }
}

/// An opposite-status item under consideration.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub item: Item,
    /// Cosine similarity from the vector path, `None` for fallback candidates.
    pub similarity: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetrievalStrategy {
    /// Nothing was retrieved.
    #[default]
    None,
    Vector,
    Recency,
}

/// A candidate the scorer accepted.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMatch {
    pub candidate: Item,
    pub confidence: Confidence,
    pub reasoning: String,
}

/// Outcome of one matching run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchRunSummary {
    pub strategy: RetrievalStrategy,
    pub candidates: usize,
    pub persisted: usize,
    pub notifications: usize,
    /// Set when the run stopped early (provider absent, item inactive).
    pub skipped: Option<&'static str>,
}

impl MatchRunSummary {
    pub(crate) fn skipped(reason: &'static str) -> Self {
        Self {
            skipped: Some(reason),
            ..Default::default()
        }
    }
}

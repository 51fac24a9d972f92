//! Cross-cutting, shared constants.
//!
//! Thresholds are expressed in the canonical unit of the value they gate:
//! confidences are 0-100 integers, vector similarities are 0-1 floats.

use std::time::Duration;

/// Matches scored below this confidence are dropped before persistence.
pub const MIN_MATCH_CONFIDENCE: u8 = 40;

/// Upper bound on matches accepted from a single scoring run.
pub const DEFAULT_MAX_MATCHES: usize = 5;

/// Minimum cosine similarity for a vector-path candidate.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.5;

/// Candidate cap for the vector path.
pub const VECTOR_CANDIDATE_LIMIT: u64 = 50;

/// Candidate cap for the recency fallback scan.
pub const FALLBACK_CANDIDATE_LIMIT: usize = 20;

/// Attempts made by the embedding client before giving up.
pub const EMBEDDING_MAX_ATTEMPTS: u32 = 3;

/// Backoff unit; attempt `n` waits `n * EMBEDDING_BACKOFF_UNIT`.
pub const EMBEDDING_BACKOFF_UNIT: Duration = Duration::from_secs(2);

/// Default embedding dimension of `text-embedding-3-small`.
pub const DEFAULT_EMBEDDING_DIM: u64 = 1536;

/// Confidence used when the verification model omits or garbles it.
pub const DEFAULT_CLAIM_CONFIDENCE: u8 = 50;

/// Subtracted when "I don't know" answers exceed half the questions.
pub const UNCERTAINTY_PENALTY: u8 = 20;

/// Added when the linked lost post is judged a strong match.
pub const STRONG_LINK_BONUS: u8 = 10;

/// Token overlap at which a linked post is treated as a strong match.
pub const STRONG_LINK_OVERLAP: f32 = 0.75;

/// Conditional-write retries for the claim analysis column.
pub const ANALYSIS_WRITE_RETRIES: u32 = 5;

/// Default attempts for an enrichment job before it is marked failed.
pub const DEFAULT_JOB_MAX_ATTEMPTS: u32 = 5;

/// Linear backoff unit between job attempts.
pub const JOB_RETRY_BACKOFF: Duration = Duration::from_secs(30);

/// A leased job whose lease is older than this is eligible again.
pub const JOB_LEASE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Jobs leased per worker wake-up.
pub const JOB_BATCH_SIZE: usize = 16;

/// Placeholder written to `ai_analysis` at claim submission.
pub const PENDING_ANALYSIS_TEXT: &str = "AI verification in progress. Results will appear here shortly.";

/// Terminal analysis text when no language model provider is configured.
pub const UNAVAILABLE_ANALYSIS_TEXT: &str =
    "AI verification is unavailable: no language model provider is configured. Please review this claim manually.";

/// Analysis text used when the verification model's reply cannot be parsed.
pub const FALLBACK_ANALYSIS_TEXT: &str =
    "Unable to complete AI analysis. Please review this claim manually.";

/// Marker preceding the one-line verdict in `ai_analysis`.
pub const VERDICT_MARKER: &str = "[VERDICT]";

/// Marker preceding the elaboration body in `ai_analysis`.
pub const ELABORATION_MARKER: &str = "[ELABORATION]";

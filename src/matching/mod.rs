//! Item matching: retrieve opposite-status candidates, have a language model
//! rank them, and persist the accepted pairs in both directions.
//!
//! ```text
//! Item ──▶ CandidateRetriever ──▶ MatchScorer ──▶ MatchPersistence
//!          (vector / recency)     (LLM, ≥ 40)     (A→B, B→A, notify ×2)
//! ```

mod error;
pub mod persistence;
pub mod pipeline;
pub mod prompt;
pub mod retriever;
pub mod scorer;
pub mod types;


pub use error::MatchingError;
pub use persistence::{MatchPersistence, PersistOutcome};
pub use pipeline::MatchingPipeline;
pub use prompt::describe_item;
pub use retriever::CandidateRetriever;
pub use scorer::MatchScorer;
pub use types::{Candidate, MatchRunSummary, MatchingConfig, RetrievalStrategy, ScoredMatch};

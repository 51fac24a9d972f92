//! Reclaim library crate (used by the server and integration tests).
//!
//! AI-assisted enrichment for a lost-and-found board: matching newly posted
//! items against items of the opposite status, and verifying ownership
//! claims on found items.
//!
//! # Public API Surface
//!
//! ## Operations
//! - [`ReclaimService`] - `trigger_matching`, `submit_claim`,
//!   `get_potential_matches`, `dismiss_match`, `review_claim`, `claim_report`
//! - [`JobWorker`] - drains the enrichment outbox
//!
//! ## Pipelines
//! - [`MatchingPipeline`] with [`CandidateRetriever`], [`MatchScorer`], [`MatchPersistence`]
//! - [`ClaimVerifier`], [`PhotoVerifier`]
//!
//! ## Providers & Storage
//! - [`OpenAiEmbedder`], [`OpenAiChatClient`] - OpenAI-compatible HTTP clients
//! - [`QdrantItemIndex`] - vector index
//! - [`RestStore`], [`MemoryStore`] - relational store
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod constants;
pub mod embedding;
pub mod gateway;
pub mod jobs;
pub mod llm;
pub mod matching;
pub mod model;
pub mod service;
pub mod store;
pub mod vectordb;
pub mod verification;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{Config, ConfigError};
#[cfg(any(test, feature = "mock"))]
pub use embedding::MockEmbedder;
pub use embedding::{Embedder, EmbeddingConfig, EmbeddingError, OpenAiEmbedder, embedding_text};
pub use jobs::{JobError, JobWorker, WorkerConfig};
#[cfg(any(test, feature = "mock"))]
pub use llm::MockChatProvider;
pub use llm::{ChatConfig, ChatProvider, LlmError, OpenAiChatClient};
pub use matching::{
    CandidateRetriever, MatchPersistence, MatchRunSummary, MatchScorer, MatchingConfig,
    MatchingError, MatchingPipeline, RetrievalStrategy,
};
pub use model::{
    Claim, ClaimDecision, ClaimStatus, Confidence, EnrichmentJob, Item, ItemStatus, JobKind,
    JobStatus, Location, NewClaim, Notification, NotificationKind, PotentialMatch, Question,
};
pub use service::{ReclaimService, ServiceError, ServiceResult};
pub use store::{MemoryStore, RestStore, RestStoreConfig, Store, StoreError};
#[cfg(any(test, feature = "mock"))]
pub use vectordb::MockItemIndex;
pub use vectordb::{ItemIndex, QdrantItemIndex, VectorDbError};
pub use verification::{
    ClaimReport, ClaimVerifier, PhotoOutcome, PhotoVerifier, VerificationError,
    VerificationOutcome,
};

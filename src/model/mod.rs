//! Domain records shared by the matching and verification pipelines.
//!
//! Rows are shaped after the relational tables they are persisted in
//! (`items`, `questions`, `claims`, `potential_matches`, `notifications`,
//! `enrichment_jobs`),
//! so the same types serialize straight into the store.

pub mod analysis;
pub mod claim;
pub mod confidence;
pub mod item;
pub mod job;
pub mod matches;


pub use analysis::{
    ClaimAnalysis, ClaimAnalysisUpdate, EvidenceAssessment, EvidenceStrength,
    LinkedPostAssessment, LinkedPostStatus, PhotoVerdict, PhotoVerificationSummary,
    QuestionAssessment, QuestionStatus,
};
pub use claim::{Claim, ClaimDecision, ClaimStatus, NewClaim, Question};
pub use confidence::Confidence;
pub use item::{Item, ItemStatus, Location, ResolutionStatus};
pub use job::{EnrichmentJob, JobKind, JobStatus};
pub use matches::{MatchEdge, NewNotification, Notification, NotificationKind, PotentialMatch};

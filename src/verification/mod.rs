//! Claim verification: a dossier-driven verdict on the claimant's answers,
//! linked post and evidence, plus an independent photo authenticity check.
//!
//! Both writers submit key-scoped [`ClaimAnalysisUpdate`](crate::model::ClaimAnalysisUpdate)s,
//! so they may run concurrently against the same claim.

pub mod claim;
pub mod dossier;
mod error;
pub mod guards;
pub mod photos;
pub mod report;
pub mod schema;

#[cfg(test)]
mod tests;

pub use claim::{ClaimVerifier, VerificationOutcome};
pub use dossier::Dossier;
pub use error::VerificationError;
pub use photos::{PhotoOutcome, PhotoVerifier, summarize_photos};
pub use report::ClaimReport;
pub use schema::ParsedVerdict;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What an enrichment job does to its target row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Retrieve, score and persist matches for an item.
    MatchItem,
    /// Produce the question/linked-post/evidence verdict for a claim.
    VerifyClaim,
    /// Run the photo authenticity check for a claim.
    VerifyPhotos,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::MatchItem => "match_item",
            JobKind::VerifyClaim => "verify_claim",
            JobKind::VerifyPhotos => "verify_photos",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Queued,
    /// Leased by a worker until `run_at`.
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

/// One row of the enrichment outbox.
///
/// While `Running`, `run_at` holds the lease expiry; a worker that dies
/// mid-job leaves the row to be picked up again once the lease lapses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentJob {
    pub id: Uuid,
    pub kind: JobKind,
    pub target_id: Uuid,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub attempts: u32,
    pub run_at: DateTime<Utc>,
    #[serde(default)]
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl EnrichmentJob {
    /// A job due immediately.
    pub fn new(kind: JobKind, target_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            kind,
            target_id,
            status: JobStatus::Queued,
            attempts: 0,
            run_at: now,
            last_error: None,
            created_at: now,
        }
    }

    /// Queued, or running with an expired lease.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status, JobStatus::Queued | JobStatus::Running) && self.run_at <= now
    }
}

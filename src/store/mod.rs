//! Relational store for items, claims, matches, notifications and jobs.
//!
//! [`RestStore`] talks to a PostgREST endpoint; [`MemoryStore`] keeps the
//! same tables in process and backs local runs and tests.

mod error;
pub mod memory;
pub mod rest;


use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use rest::{RestStore, RestStoreConfig};

use crate::model::{
    Claim, ClaimAnalysisUpdate, ClaimStatus, EnrichmentJob, Item, ItemStatus, MatchEdge,
    NewNotification, Notification, PotentialMatch, Question,
};

/// Recency scan used when vector retrieval yields nothing.
#[derive(Debug, Clone, Copy)]
pub struct RecentItemsQuery {
    pub status: ItemStatus,
    pub exclude_owner: Uuid,
    pub exclude_item: Uuid,
    pub limit: usize,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_item(&self, item: Item) -> StoreResult<Item>;
    async fn get_item(&self, id: Uuid) -> StoreResult<Option<Item>>;
    /// Rows for the ids that exist, in no particular order.
    async fn get_items(&self, ids: &[Uuid]) -> StoreResult<Vec<Item>>;
    async fn set_item_embedding(&self, id: Uuid, embedding: &[f32]) -> StoreResult<()>;
    /// Active items of the given status, newest first.
    async fn recent_items(&self, query: RecentItemsQuery) -> StoreResult<Vec<Item>>;
    /// Marks the item as pending resolution by `claim_id`.
    async fn request_resolution(
        &self,
        item_id: Uuid,
        claim_id: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<()>;

    async fn insert_question(&self, question: Question) -> StoreResult<Question>;
    async fn questions_for_item(&self, item_id: Uuid) -> StoreResult<Vec<Question>>;

    async fn insert_claim(&self, claim: Claim) -> StoreResult<Claim>;
    async fn get_claim(&self, id: Uuid) -> StoreResult<Option<Claim>>;
    /// Applies `update` atomically with respect to other analysis writers.
    async fn update_claim_analysis(
        &self,
        id: Uuid,
        update: &ClaimAnalysisUpdate,
    ) -> StoreResult<Claim>;
    async fn set_claim_status(&self, id: Uuid, status: ClaimStatus) -> StoreResult<Claim>;

    /// Upserts on `(item_id, matched_item_id)`, keeping the row's dismissal flag.
    async fn upsert_match(&self, edge: &MatchEdge) -> StoreResult<PotentialMatch>;
    /// Undismissed rows whose `item_id` is the given item, best first.
    async fn matches_for_item(&self, item_id: Uuid) -> StoreResult<Vec<PotentialMatch>>;
    async fn dismiss_match(&self, match_id: Uuid) -> StoreResult<PotentialMatch>;

    async fn insert_notification(&self, notification: NewNotification)
    -> StoreResult<Notification>;

    async fn enqueue_job(&self, job: EnrichmentJob) -> StoreResult<EnrichmentJob>;
    /// Leases up to `limit` due jobs, bumping their attempt count.
    async fn lease_due_jobs(
        &self,
        now: DateTime<Utc>,
        limit: usize,
        lease: Duration,
    ) -> StoreResult<Vec<EnrichmentJob>>;
    async fn complete_job(&self, id: Uuid) -> StoreResult<()>;
    async fn reschedule_job(
        &self,
        id: Uuid,
        run_at: DateTime<Utc>,
        error: &str,
    ) -> StoreResult<()>;
    async fn fail_job(&self, id: Uuid, error: &str) -> StoreResult<()>;
}

pub(crate) fn lease_expiry(now: DateTime<Utc>, lease: Duration) -> DateTime<Utc> {
    now + chrono::Duration::from_std(lease).unwrap_or_else(|_| chrono::Duration::minutes(10))
}

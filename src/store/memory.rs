use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use super::error::{StoreError, StoreResult};
use super::{RecentItemsQuery, Store, lease_expiry};
use crate::model::{
    Claim, ClaimAnalysisUpdate, ClaimStatus, EnrichmentJob, Item, JobStatus, MatchEdge,
    NewNotification, Notification, PotentialMatch, Question, ResolutionStatus,
};

#[derive(Default)]
struct Tables {
    items: HashMap<Uuid, Item>,
    questions: Vec<Question>,
    claims: HashMap<Uuid, Claim>,
    matches: HashMap<(Uuid, Uuid), PotentialMatch>,
    notifications: Vec<Notification>,
    jobs: HashMap<Uuid, EnrichmentJob>,
}

/// In-process store; every operation runs under one lock.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    reject_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent data write fail with [`StoreError::Unavailable`].
    ///
    /// Job bookkeeping is unaffected so the worker can still record failures.
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// All notifications in insertion order.
    pub fn notifications(&self) -> Vec<Notification> {
        self.tables.read().notifications.clone()
    }

    /// Every match row, dismissed or not.
    pub fn all_matches(&self) -> Vec<PotentialMatch> {
        self.tables.read().matches.values().cloned().collect()
    }

    pub fn jobs(&self) -> Vec<EnrichmentJob> {
        let mut jobs: Vec<_> = self.tables.read().jobs.values().cloned().collect();
        jobs.sort_by_key(|j| j.created_at);
        jobs
    }

    fn check_writable(&self) -> StoreResult<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable {
                reason: "writes rejected".to_string(),
            });
        }
        Ok(())
    }
}

fn job_mut(tables: &mut Tables, id: Uuid) -> StoreResult<&mut EnrichmentJob> {
    tables
        .jobs
        .get_mut(&id)
        .ok_or(StoreError::NotFound { entity: "job", id })
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_item(&self, item: Item) -> StoreResult<Item> {
        self.check_writable()?;
        self.tables.write().items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn get_item(&self, id: Uuid) -> StoreResult<Option<Item>> {
        Ok(self.tables.read().items.get(&id).cloned())
    }

    async fn get_items(&self, ids: &[Uuid]) -> StoreResult<Vec<Item>> {
        let tables = self.tables.read();
        Ok(ids
            .iter()
            .filter_map(|id| tables.items.get(id).cloned())
            .collect())
    }

    async fn set_item_embedding(&self, id: Uuid, embedding: &[f32]) -> StoreResult<()> {
        self.check_writable()?;
        let mut tables = self.tables.write();
        let item = tables
            .items
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "item", id })?;
        item.embedding = Some(embedding.to_vec());
        Ok(())
    }

    async fn recent_items(&self, query: RecentItemsQuery) -> StoreResult<Vec<Item>> {
        let tables = self.tables.read();
        let mut items: Vec<Item> = tables
            .items
            .values()
            .filter(|i| i.is_matchable() && i.status == query.status)
            .filter(|i| i.owner_id != query.exclude_owner && i.id != query.exclude_item)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items.truncate(query.limit);
        Ok(items)
    }

    async fn request_resolution(
        &self,
        item_id: Uuid,
        claim_id: Uuid,
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.check_writable()?;
        let mut tables = self.tables.write();
        let item = tables.items.get_mut(&item_id).ok_or(StoreError::NotFound {
            entity: "item",
            id: item_id,
        })?;
        item.resolution_status = ResolutionStatus::Pending;
        item.resolved_claim_id = Some(claim_id);
        item.resolution_requested_at = Some(at);
        Ok(())
    }

    async fn insert_question(&self, question: Question) -> StoreResult<Question> {
        self.check_writable()?;
        self.tables.write().questions.push(question.clone());
        Ok(question)
    }

    async fn questions_for_item(&self, item_id: Uuid) -> StoreResult<Vec<Question>> {
        Ok(self
            .tables
            .read()
            .questions
            .iter()
            .filter(|q| q.item_id == item_id)
            .cloned()
            .collect())
    }

    async fn insert_claim(&self, claim: Claim) -> StoreResult<Claim> {
        self.check_writable()?;
        self.tables.write().claims.insert(claim.id, claim.clone());
        Ok(claim)
    }

    async fn get_claim(&self, id: Uuid) -> StoreResult<Option<Claim>> {
        Ok(self.tables.read().claims.get(&id).cloned())
    }

    async fn update_claim_analysis(
        &self,
        id: Uuid,
        update: &ClaimAnalysisUpdate,
    ) -> StoreResult<Claim> {
        self.check_writable()?;
        let mut tables = self.tables.write();
        let claim = tables
            .claims
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "claim", id })?;
        claim.apply_analysis_update(update);
        Ok(claim.clone())
    }

    async fn set_claim_status(&self, id: Uuid, status: ClaimStatus) -> StoreResult<Claim> {
        self.check_writable()?;
        let mut tables = self.tables.write();
        let claim = tables
            .claims
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "claim", id })?;
        claim.status = status;
        claim.reviewed_at = Some(Utc::now());
        Ok(claim.clone())
    }

    async fn upsert_match(&self, edge: &MatchEdge) -> StoreResult<PotentialMatch> {
        self.check_writable()?;
        let now = Utc::now();
        let mut tables = self.tables.write();
        let row = tables
            .matches
            .entry((edge.item_id, edge.matched_item_id))
            .and_modify(|row| {
                row.confidence_score = edge.confidence_score;
                row.reasoning = edge.reasoning.clone();
                row.updated_at = now;
            })
            .or_insert_with(|| PotentialMatch {
                id: Uuid::new_v4(),
                item_id: edge.item_id,
                matched_item_id: edge.matched_item_id,
                confidence_score: edge.confidence_score,
                reasoning: edge.reasoning.clone(),
                is_dismissed: false,
                created_at: now,
                updated_at: now,
            });
        Ok(row.clone())
    }

    async fn matches_for_item(&self, item_id: Uuid) -> StoreResult<Vec<PotentialMatch>> {
        let tables = self.tables.read();
        let mut rows: Vec<PotentialMatch> = tables
            .matches
            .values()
            .filter(|m| m.item_id == item_id && !m.is_dismissed)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.confidence_score
                .cmp(&a.confidence_score)
                .then(b.updated_at.cmp(&a.updated_at))
        });
        Ok(rows)
    }

    async fn dismiss_match(&self, match_id: Uuid) -> StoreResult<PotentialMatch> {
        self.check_writable()?;
        let mut tables = self.tables.write();
        let row = tables
            .matches
            .values_mut()
            .find(|m| m.id == match_id)
            .ok_or(StoreError::NotFound {
                entity: "match",
                id: match_id,
            })?;
        row.is_dismissed = true;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn insert_notification(
        &self,
        notification: NewNotification,
    ) -> StoreResult<Notification> {
        self.check_writable()?;
        let row = Notification::from_new(notification);
        self.tables.write().notifications.push(row.clone());
        Ok(row)
    }

    async fn enqueue_job(&self, job: EnrichmentJob) -> StoreResult<EnrichmentJob> {
        self.check_writable()?;
        self.tables.write().jobs.insert(job.id, job.clone());
        Ok(job)
    }

    async fn lease_due_jobs(
        &self,
        now: DateTime<Utc>,
        limit: usize,
        lease: Duration,
    ) -> StoreResult<Vec<EnrichmentJob>> {
        let expiry = lease_expiry(now, lease);
        let mut tables = self.tables.write();

        let mut due: Vec<&mut EnrichmentJob> =
            tables.jobs.values_mut().filter(|j| j.is_due(now)).collect();
        due.sort_by_key(|j| j.run_at);

        Ok(due
            .into_iter()
            .take(limit)
            .map(|job| {
                job.status = JobStatus::Running;
                job.attempts += 1;
                job.run_at = expiry;
                job.clone()
            })
            .collect())
    }

    async fn complete_job(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let job = job_mut(&mut tables, id)?;
        job.status = JobStatus::Succeeded;
        job.last_error = None;
        Ok(())
    }

    async fn reschedule_job(
        &self,
        id: Uuid,
        run_at: DateTime<Utc>,
        error: &str,
    ) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let job = job_mut(&mut tables, id)?;
        job.status = JobStatus::Queued;
        job.run_at = run_at;
        job.last_error = Some(error.to_string());
        Ok(())
    }

    async fn fail_job(&self, id: Uuid, error: &str) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let job = job_mut(&mut tables, id)?;
        job.status = JobStatus::Failed;
        job.last_error = Some(error.to_string());
        Ok(())
    }
}

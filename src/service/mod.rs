//! Operations exposed to the rest of the application.
//!
//! Every trigger returns as soon as its primary row and its enrichment jobs
//! are written; the [`JobWorker`](crate::jobs::JobWorker) does the AI work.

mod error;

#[cfg(test)]
mod tests;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

pub use error::{ServiceError, ServiceResult};

use crate::embedding::Embedder;
use crate::jobs::{JobWorker, WorkerConfig};
use crate::llm::ChatProvider;
use crate::matching::{
    CandidateRetriever, MatchPersistence, MatchScorer, MatchingConfig, MatchingPipeline,
};
use crate::model::{
    Claim, ClaimDecision, ClaimStatus, EnrichmentJob, ItemStatus, JobKind, NewClaim,
    NewNotification, NotificationKind, PotentialMatch,
};
use crate::store::{Store, StoreError};
use crate::vectordb::ItemIndex;
use crate::verification::{ClaimReport, ClaimVerifier, PhotoVerifier};

pub struct ReclaimService {
    store: Arc<dyn Store>,
    worker: JobWorker,
}

impl ReclaimService {
    pub fn new(store: Arc<dyn Store>, worker: JobWorker) -> Self {
        Self { store, worker }
    }

    /// Wires the matching and verification pipelines over shared clients.
    pub fn assemble(
        store: Arc<dyn Store>,
        embedder: Arc<dyn Embedder>,
        index: Option<Arc<dyn ItemIndex>>,
        llm: Arc<dyn ChatProvider>,
        matching: MatchingConfig,
        worker: WorkerConfig,
    ) -> Self {
        let pipeline = MatchingPipeline::new(
            store.clone(),
            CandidateRetriever::new(embedder, index, store.clone(), matching.clone()),
            MatchScorer::new(llm.clone(), matching.clone()),
            MatchPersistence::new(store.clone(), matching),
        );
        let worker = JobWorker::new(
            store.clone(),
            Arc::new(pipeline),
            Arc::new(ClaimVerifier::new(store.clone(), llm.clone())),
            Arc::new(PhotoVerifier::new(store.clone(), llm)),
            worker,
        );
        Self::new(store, worker)
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn worker(&self) -> &JobWorker {
        &self.worker
    }

    /// Queues matching for an item; returns the job id.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn trigger_matching(&self, item_id: Uuid) -> ServiceResult<Uuid> {
        self.store
            .get_item(item_id)
            .await?
            .ok_or(ServiceError::ItemNotFound { item_id })?;

        let job = self.enqueue(JobKind::MatchItem, item_id).await?;
        self.worker.nudge();
        Ok(job.id)
    }

    /// Stores a claim with placeholder analysis and queues its verification.
    #[instrument(skip(self, new), fields(item_id = %new.item_id, photos = new.photo_urls.len()))]
    pub async fn submit_claim(&self, new: NewClaim) -> ServiceResult<Uuid> {
        self.validate_claim(&new).await?;

        let claim = self.store.insert_claim(Claim::submitted(new)).await?;
        self.enqueue(JobKind::VerifyClaim, claim.id).await?;
        if claim.has_photos() {
            self.enqueue(JobKind::VerifyPhotos, claim.id).await?;
        }
        self.worker.nudge();

        info!(claim_id = %claim.id, "Claim submitted");
        Ok(claim.id)
    }

    pub async fn get_potential_matches(&self, item_id: Uuid) -> ServiceResult<Vec<PotentialMatch>> {
        Ok(self.store.matches_for_item(item_id).await?)
    }

    /// Hides a match row from its viewer; the mirrored row is untouched.
    pub async fn dismiss_match(&self, match_id: Uuid) -> ServiceResult<PotentialMatch> {
        self.store
            .dismiss_match(match_id)
            .await
            .map_err(|e| match e {
                StoreError::NotFound { .. } => ServiceError::MatchNotFound { match_id },
                other => other.into(),
            })
    }

    /// Records the owner's decision and notifies the claimant.
    ///
    /// Approval also puts the item into pending resolution.
    #[instrument(skip(self), fields(claim_id = %claim_id, decision = %decision))]
    pub async fn review_claim(
        &self,
        claim_id: Uuid,
        decision: ClaimDecision,
    ) -> ServiceResult<Claim> {
        let claim = self.claim(claim_id).await?;
        if claim.status != ClaimStatus::Pending {
            return Err(ServiceError::AlreadyReviewed {
                claim_id,
                status: claim.status,
            });
        }

        let (status, kind, title, message) = match decision {
            ClaimDecision::Approve => (
                ClaimStatus::Approved,
                NotificationKind::ClaimApproved,
                "Claim approved",
                "The finder approved your claim. Arrange the hand-over from the item page.",
            ),
            ClaimDecision::Reject => (
                ClaimStatus::Rejected,
                NotificationKind::ClaimRejected,
                "Claim not approved",
                "The finder did not approve your claim.",
            ),
        };

        let claim = self.store.set_claim_status(claim_id, status).await?;
        if decision == ClaimDecision::Approve {
            self.store
                .request_resolution(claim.item_id, claim.id, Utc::now())
                .await?;
        }
        self.store
            .insert_notification(NewNotification {
                user_id: claim.claimant_id,
                kind,
                title: title.to_string(),
                message: message.to_string(),
                link: format!("/items/{}", claim.item_id),
                metadata: json!({ "claim_id": claim.id, "item_id": claim.item_id }),
            })
            .await?;

        info!(status = ?claim.status, "Claim reviewed");
        Ok(claim)
    }

    pub async fn claim_report(&self, claim_id: Uuid) -> ServiceResult<ClaimReport> {
        Ok(ClaimReport::from_claim(&self.claim(claim_id).await?))
    }

    async fn claim(&self, claim_id: Uuid) -> ServiceResult<Claim> {
        self.store
            .get_claim(claim_id)
            .await?
            .ok_or(ServiceError::ClaimNotFound { claim_id })
    }

    async fn enqueue(&self, kind: JobKind, target_id: Uuid) -> ServiceResult<EnrichmentJob> {
        Ok(self
            .store
            .enqueue_job(EnrichmentJob::new(kind, target_id))
            .await?)
    }

    async fn validate_claim(&self, new: &NewClaim) -> ServiceResult<()> {
        let item = self
            .store
            .get_item(new.item_id)
            .await?
            .ok_or(ServiceError::ItemNotFound {
                item_id: new.item_id,
            })?;
        let invalid = |reason: &str| {
            Err(ServiceError::InvalidClaim {
                reason: reason.to_string(),
            })
        };

        if item.status != ItemStatus::Found {
            return invalid("only found items can be claimed");
        }
        if item.owner_id == new.claimant_id {
            return invalid("the finder cannot claim their own item");
        }
        if new.photo_urls.iter().any(|url| url.trim().is_empty()) {
            return invalid("photo urls must not be empty");
        }

        let questions: HashSet<Uuid> = self
            .store
            .questions_for_item(item.id)
            .await?
            .into_iter()
            .map(|q| q.id)
            .collect();
        if new.answers.keys().any(|id| !questions.contains(id)) {
            return invalid("answers must reference the item's questions");
        }

        if let Some(post_id) = new.linked_post_id {
            match self.store.get_item(post_id).await? {
                Some(post) if post.status == ItemStatus::Lost => {}
                Some(_) => return invalid("the linked post must be a lost item"),
                None => return invalid("the linked post does not exist"),
            }
        }
        Ok(())
    }
}

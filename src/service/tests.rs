use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use super::*;
use crate::jobs::WorkerConfig;
use crate::llm::MockChatProvider;
use crate::model::{
    Item, ItemStatus, JobKind, JobStatus, Location, NotificationKind, Question, ResolutionStatus,
};
use crate::store::MemoryStore;
use crate::test_support::worker_with;

struct Fixture {
    store: Arc<MemoryStore>,
    service: ReclaimService,
    lost: Item,
    found: Item,
    question: Question,
}

impl Fixture {
    async fn new(reply: impl FnOnce(&Item) -> String) -> Self {
        let store = Arc::new(MemoryStore::new());
        let lost = store
            .insert_item(Item::new(
                Uuid::new_v4(),
                ItemStatus::Lost,
                "Blue backpack",
                "Jansport with a broken zipper",
                "Bags",
                Location::new("Library"),
            ))
            .await
            .unwrap();
        let found = store
            .insert_item(Item::new(
                Uuid::new_v4(),
                ItemStatus::Found,
                "Backpack",
                "Blue Jansport",
                "Bags",
                Location::new("Library"),
            ))
            .await
            .unwrap();
        let question = store
            .insert_question(Question::new(found.id, "What is in the front pocket?"))
            .await
            .unwrap();

        let llm = Arc::new(MockChatProvider::replying(reply(&found)));
        let worker = worker_with(store.clone(), llm, WorkerConfig::default());
        Self {
            service: ReclaimService::new(store.clone(), worker),
            store,
            lost,
            found,
            question,
        }
    }

    fn claim(&self, claimant_id: Uuid, photos: usize) -> NewClaim {
        NewClaim {
            item_id: self.found.id,
            claimant_id,
            answers: BTreeMap::from([(self.question.id, "A calculator".to_string())]),
            photo_urls: (0..photos)
                .map(|i| format!("https://cdn.example/{i}.jpg"))
                .collect(),
            linked_post_id: None,
        }
    }

    async fn run_jobs(&self) {
        self.service.worker().run_due().await.unwrap();
    }
}

fn match_reply(found: &Item) -> String {
    json!({"matches": [{"candidate_id": found.id, "confidence": 75, "reasoning": "Both blue Jansports"}]})
        .to_string()
}

fn verdict_reply(_: &Item) -> String {
    json!({
        "confidence_percentage": 68,
        "analysis": "[VERDICT] Plausible owner. [ELABORATION] Pocket contents match.",
        "is_likely_original": true,
        "confidence": 80
    })
    .to_string()
}

#[tokio::test]
async fn test_trigger_matching_queues_and_matches() {
    let f = Fixture::new(match_reply).await;

    let err = f.service.trigger_matching(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ServiceError::ItemNotFound { .. }));

    let job_id = f.service.trigger_matching(f.lost.id).await.unwrap();
    let jobs = f.store.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].id, job_id);
    assert_eq!(jobs[0].kind, JobKind::MatchItem);
    assert!(f.service.get_potential_matches(f.lost.id).await.unwrap().is_empty());

    f.run_jobs().await;

    let for_lost = f.service.get_potential_matches(f.lost.id).await.unwrap();
    let for_found = f.service.get_potential_matches(f.found.id).await.unwrap();
    assert_eq!(for_lost.len(), 1);
    assert_eq!(for_found.len(), 1);
    assert_eq!(for_lost[0].matched_item_id, f.found.id);
    assert_eq!(for_found[0].matched_item_id, f.lost.id);
}

#[tokio::test]
async fn test_dismiss_hides_only_one_direction() {
    let f = Fixture::new(match_reply).await;
    f.service.trigger_matching(f.lost.id).await.unwrap();
    f.run_jobs().await;
    let row = f.service.get_potential_matches(f.lost.id).await.unwrap()[0].clone();

    let dismissed = f.service.dismiss_match(row.id).await.unwrap();

    assert!(dismissed.is_dismissed);
    assert!(f.service.get_potential_matches(f.lost.id).await.unwrap().is_empty());
    assert_eq!(f.service.get_potential_matches(f.found.id).await.unwrap().len(), 1);

    let err = f.service.dismiss_match(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, ServiceError::MatchNotFound { .. }));
}

#[tokio::test]
async fn test_submit_claim_queues_photo_check_only_with_photos() {
    let f = Fixture::new(verdict_reply).await;

    let without = f.service.submit_claim(f.claim(Uuid::new_v4(), 0)).await.unwrap();
    let with = f.service.submit_claim(f.claim(Uuid::new_v4(), 2)).await.unwrap();

    let kinds = |claim_id: Uuid| -> Vec<JobKind> {
        f.store
            .jobs()
            .into_iter()
            .filter(|j| j.target_id == claim_id)
            .map(|j| j.kind)
            .collect()
    };
    assert_eq!(kinds(without), vec![JobKind::VerifyClaim]);
    let mut both = kinds(with);
    both.sort_by_key(|k| k.as_str());
    assert_eq!(both, vec![JobKind::VerifyClaim, JobKind::VerifyPhotos]);

    let pending = f.service.claim_report(with).await.unwrap();
    assert!(pending.pending);

    f.run_jobs().await;

    assert!(f.store.jobs().iter().all(|j| j.status == JobStatus::Succeeded));
    let report = f.service.claim_report(with).await.unwrap();
    assert!(!report.pending);
    assert_eq!(report.verdict, "Plausible owner.");
    assert_eq!(report.photos.unwrap().photos_analyzed, 2);
    assert!(f.service.claim_report(without).await.unwrap().photos.is_none());
}

#[tokio::test]
async fn test_submit_claim_rejects_invalid_claims() {
    let f = Fixture::new(verdict_reply).await;

    let mut on_lost = f.claim(Uuid::new_v4(), 0);
    on_lost.item_id = f.lost.id;
    on_lost.answers.clear();

    let own = f.claim(f.found.owner_id, 0);

    let mut stray_answer = f.claim(Uuid::new_v4(), 0);
    stray_answer
        .answers
        .insert(Uuid::new_v4(), "Something".to_string());

    let mut bad_link = f.claim(Uuid::new_v4(), 0);
    bad_link.linked_post_id = Some(f.found.id);

    for claim in [on_lost, own, stray_answer, bad_link] {
        let err = f.service.submit_claim(claim).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidClaim { .. }), "{err}");
    }
    assert!(f.store.jobs().is_empty());

    let mut missing = f.claim(Uuid::new_v4(), 0);
    missing.item_id = Uuid::new_v4();
    assert!(matches!(
        f.service.submit_claim(missing).await.unwrap_err(),
        ServiceError::ItemNotFound { .. }
    ));
}

#[tokio::test]
async fn test_linked_lost_post_is_accepted() {
    let f = Fixture::new(verdict_reply).await;
    let mut claim = f.claim(f.lost.owner_id, 0);
    claim.linked_post_id = Some(f.lost.id);
    assert!(f.service.submit_claim(claim).await.is_ok());
}

#[tokio::test]
async fn test_approval_starts_resolution_and_notifies_claimant() {
    let f = Fixture::new(verdict_reply).await;
    let claimant = Uuid::new_v4();
    let claim_id = f.service.submit_claim(f.claim(claimant, 0)).await.unwrap();

    let claim = f
        .service
        .review_claim(claim_id, ClaimDecision::Approve)
        .await
        .unwrap();

    assert_eq!(claim.status, ClaimStatus::Approved);
    assert!(claim.reviewed_at.is_some());
    let item = f.store.get_item(f.found.id).await.unwrap().unwrap();
    assert_eq!(item.resolution_status, ResolutionStatus::Pending);
    assert_eq!(item.resolved_claim_id, Some(claim_id));
    assert!(item.resolution_requested_at.is_some());

    let notifications = f.store.notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].user_id, claimant);
    assert_eq!(notifications[0].kind, NotificationKind::ClaimApproved);
    assert_eq!(notifications[0].metadata["claim_id"], json!(claim_id));

    let err = f
        .service
        .review_claim(claim_id, ClaimDecision::Reject)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::AlreadyReviewed {
            status: ClaimStatus::Approved,
            ..
        }
    ));
}

#[tokio::test]
async fn test_rejection_notifies_without_resolution() {
    let f = Fixture::new(verdict_reply).await;
    let claimant = Uuid::new_v4();
    let claim_id = f.service.submit_claim(f.claim(claimant, 0)).await.unwrap();

    f.service
        .review_claim(claim_id, ClaimDecision::Reject)
        .await
        .unwrap();

    let item = f.store.get_item(f.found.id).await.unwrap().unwrap();
    assert_eq!(item.resolution_status, ResolutionStatus::None);
    assert_eq!(f.store.notifications()[0].kind, NotificationKind::ClaimRejected);

    let err = f
        .service
        .review_claim(Uuid::new_v4(), ClaimDecision::Approve)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ClaimNotFound { .. }));
}

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use super::*;
use crate::llm::{ChatRequest, LlmError, MockChatProvider, ModelPurpose};
use crate::model::{
    Claim, EnrichmentJob, Item, ItemStatus, JobKind, JobStatus, Location, NewClaim,
};
use crate::store::{MemoryStore, Store};
use crate::test_support::worker_with;

fn fast_retries(max_attempts: u32) -> WorkerConfig {
    WorkerConfig {
        poll_interval: Duration::from_millis(20),
        max_attempts,
        retry_backoff: Duration::ZERO,
        ..Default::default()
    }
}

async fn seed_pair(store: &MemoryStore) -> (Item, Item) {
    let lost = Item::new(
        Uuid::new_v4(),
        ItemStatus::Lost,
        "Black wallet",
        "Leather bifold",
        "Accessories",
        Location::new("Central Station"),
    );
    let found = Item::new(
        Uuid::new_v4(),
        ItemStatus::Found,
        "Wallet, black leather",
        "Found on a bench",
        "Accessories",
        Location::new("Central Station"),
    );
    (
        store.insert_item(lost).await.unwrap(),
        store.insert_item(found).await.unwrap(),
    )
}

async fn seed_claim(store: &MemoryStore, item: &Item, photos: usize) -> Claim {
    let claim = Claim::submitted(NewClaim {
        item_id: item.id,
        claimant_id: Uuid::new_v4(),
        answers: BTreeMap::new(),
        photo_urls: (0..photos)
            .map(|i| format!("https://cdn.example/{i}.jpg"))
            .collect(),
        linked_post_id: None,
    });
    store.insert_claim(claim).await.unwrap()
}

/// Vision requests get a photo verdict, text requests a claim verdict.
fn claim_provider(request: &ChatRequest) -> Result<String, LlmError> {
    if request.purpose == ModelPurpose::Vision {
        return Ok(json!({"is_likely_original": true, "confidence": 90, "analysis": "Phone photo"})
            .to_string());
    }
    Ok(json!({"confidence_percentage": 77, "analysis": "[VERDICT] Owner. [ELABORATION] Fine."})
        .to_string())
}

fn job(store: &MemoryStore, id: Uuid) -> EnrichmentJob {
    store
        .jobs()
        .into_iter()
        .find(|j| j.id == id)
        .expect("job exists")
}

#[tokio::test]
async fn test_match_job_persists_both_directions() {
    let store = Arc::new(MemoryStore::new());
    let (lost, found) = seed_pair(&store).await;
    let reply = json!({"matches": [{"candidate_id": found.id, "confidence": 82, "reasoning": "Same"}]});
    let llm = Arc::new(MockChatProvider::replying(reply.to_string()));
    let worker = worker_with(store.clone(), llm, WorkerConfig::default());
    let queued = store
        .enqueue_job(EnrichmentJob::new(JobKind::MatchItem, lost.id))
        .await
        .unwrap();

    assert_eq!(worker.run_due().await.unwrap(), 1);

    let done = job(&store, queued.id);
    assert_eq!(done.status, JobStatus::Succeeded);
    assert_eq!(done.attempts, 1);
    assert_eq!(store.all_matches().len(), 2);
    assert_eq!(store.notifications().len(), 2);
    assert_eq!(worker.run_due().await.unwrap(), 0);
}

#[tokio::test]
async fn test_claim_and_photo_jobs_run_together() {
    let store = Arc::new(MemoryStore::new());
    let (_, found) = seed_pair(&store).await;
    let claim = seed_claim(&store, &found, 2).await;
    let worker = worker_with(
        store.clone(),
        Arc::new(MockChatProvider::new(claim_provider)),
        WorkerConfig::default(),
    );
    for kind in [JobKind::VerifyClaim, JobKind::VerifyPhotos] {
        store
            .enqueue_job(EnrichmentJob::new(kind, claim.id))
            .await
            .unwrap();
    }

    assert_eq!(worker.run_due().await.unwrap(), 2);

    assert!(store.jobs().iter().all(|j| j.status == JobStatus::Succeeded));
    let stored = store.get_claim(claim.id).await.unwrap().unwrap();
    assert_eq!(stored.ai_verdict, "77");
    assert!(stored.ai_question_analysis.photo_verification.is_some());
    assert_eq!(stored.analysis_version, 2);
}

#[tokio::test]
async fn test_store_failure_is_retried_then_failed() {
    let store = Arc::new(MemoryStore::new());
    let (_, found) = seed_pair(&store).await;
    let claim = seed_claim(&store, &found, 0).await;
    let worker = worker_with(
        store.clone(),
        Arc::new(MockChatProvider::new(claim_provider)),
        fast_retries(2),
    );
    let queued = store
        .enqueue_job(EnrichmentJob::new(JobKind::VerifyClaim, claim.id))
        .await
        .unwrap();
    store.set_reject_writes(true);

    worker.run_due().await.unwrap();
    let retried = job(&store, queued.id);
    assert_eq!(retried.status, JobStatus::Queued);
    assert_eq!(retried.attempts, 1);
    assert!(retried.last_error.as_deref().unwrap().contains("writes rejected"));

    worker.run_due().await.unwrap();
    let failed = job(&store, queued.id);
    assert_eq!(failed.status, JobStatus::Failed);
    assert_eq!(failed.attempts, 2);
}

#[tokio::test]
async fn test_retry_is_backed_off() {
    let store = Arc::new(MemoryStore::new());
    let (_, found) = seed_pair(&store).await;
    let claim = seed_claim(&store, &found, 0).await;
    let worker = worker_with(
        store.clone(),
        Arc::new(MockChatProvider::new(|_| {
            Err(LlmError::Request {
                reason: "connection reset".to_string(),
            })
        })),
        WorkerConfig::default(),
    );
    let queued = store
        .enqueue_job(EnrichmentJob::new(JobKind::VerifyClaim, claim.id))
        .await
        .unwrap();

    let before = Utc::now();
    worker.run_due().await.unwrap();

    let retried = job(&store, queued.id);
    assert_eq!(retried.status, JobStatus::Queued);
    assert!(retried.run_at >= before + chrono::Duration::seconds(29));
    assert_eq!(worker.run_due().await.unwrap(), 0);
}

#[tokio::test]
async fn test_missing_target_fails_without_retry() {
    let store = Arc::new(MemoryStore::new());
    let worker = worker_with(
        store.clone(),
        Arc::new(MockChatProvider::new(claim_provider)),
        fast_retries(5),
    );
    let queued = store
        .enqueue_job(EnrichmentJob::new(JobKind::VerifyClaim, Uuid::new_v4()))
        .await
        .unwrap();

    worker.run_due().await.unwrap();

    let failed = job(&store, queued.id);
    assert_eq!(failed.status, JobStatus::Failed);
    assert_eq!(failed.attempts, 1);
}

#[tokio::test]
async fn test_loop_wakes_on_nudge_and_stops() {
    let store = Arc::new(MemoryStore::new());
    let (_, found) = seed_pair(&store).await;
    let claim = seed_claim(&store, &found, 0).await;
    let worker = worker_with(
        store.clone(),
        Arc::new(MockChatProvider::new(claim_provider)),
        WorkerConfig {
            poll_interval: Duration::from_secs(3600),
            ..Default::default()
        },
    );
    let handle = worker.spawn();
    tokio::time::sleep(Duration::from_millis(50)).await;

    store
        .enqueue_job(EnrichmentJob::new(JobKind::VerifyClaim, claim.id))
        .await
        .unwrap();
    worker.nudge();

    tokio::time::timeout(Duration::from_secs(5), async {
        while store.jobs()[0].status != JobStatus::Succeeded {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("nudged job completes");

    worker.shutdown();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("worker stops")
        .unwrap();
}

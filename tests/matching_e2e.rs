//! End-to-end matching through the service and the job worker.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use reclaim::model::NotificationKind;
use reclaim::vectordb::{IndexedItem, ItemIndex};
use reclaim::{Confidence, MockChatProvider, MockEmbedder, MockItemIndex, Store};
use serde_json::json;
use uuid::Uuid;

use common::fixtures::{TestBed, found_wallet, lost_wallet};

/// Replies with the given confidences in turn, repeating the last one.
fn scripted_scores(candidate_id: Uuid, scores: &'static [u8]) -> MockChatProvider {
    let calls = Arc::new(AtomicUsize::new(0));
    MockChatProvider::new(move |_| {
        let n = calls.fetch_add(1, Ordering::SeqCst).min(scores.len() - 1);
        Ok(json!({
            "matches": [{
                "candidate_id": candidate_id,
                "confidence": scores[n],
                "reasoning": "Both are black leather wallets from Central Station"
            }]
        })
        .to_string())
    })
}

#[tokio::test]
async fn test_vector_match_persists_both_directions_and_rescores() {
    let lost = lost_wallet(Uuid::new_v4());
    let found = found_wallet(Uuid::new_v4());

    let index = Arc::new(MockItemIndex::new());
    index
        .upsert_item(IndexedItem::from_item(&found, vec![0.82, 0.5724]))
        .await
        .unwrap();
    let embedder = MockEmbedder::new().with_rule("Black wallet", vec![1.0, 0.0]);
    let bed = TestBed::new(
        Arc::new(embedder),
        Some(index.clone() as Arc<dyn ItemIndex>),
        scripted_scores(found.id, &[86, 64]),
    );
    let lost = bed.insert(lost).await;
    let found = bed.insert(found).await;

    bed.service.trigger_matching(lost.id).await.unwrap();
    assert_eq!(bed.run_jobs().await, 1);

    let prompt = bed.llm.requests()[0].user_text();
    assert!(prompt.contains("82%"), "{prompt}");
    assert!(prompt.contains(&found.id.to_string()));

    let forward = bed.service.get_potential_matches(lost.id).await.unwrap();
    let backward = bed.service.get_potential_matches(found.id).await.unwrap();
    assert_eq!(forward.len(), 1);
    assert_eq!(backward.len(), 1);
    assert_eq!(forward[0].matched_item_id, found.id);
    assert_eq!(backward[0].matched_item_id, lost.id);
    assert_eq!(forward[0].confidence_score, Confidence::new(86));

    let notified: Vec<_> = bed.store.notifications().iter().map(|n| n.user_id).collect();
    assert_eq!(notified.len(), 2);
    assert!(notified.contains(&lost.owner_id));
    assert!(notified.contains(&found.owner_id));
    assert!(
        bed.store
            .notifications()
            .iter()
            .all(|n| n.kind == NotificationKind::MatchFound)
    );

    // The new item is embedded once, stored and indexed.
    assert!(index.get(&lost.id).is_some());
    let stored = bed.store.get_item(lost.id).await.unwrap().unwrap();
    assert_eq!(stored.embedding, Some(vec![1.0, 0.0]));

    bed.service.trigger_matching(lost.id).await.unwrap();
    bed.run_jobs().await;

    assert_eq!(bed.store.all_matches().len(), 2);
    let forward = bed.service.get_potential_matches(lost.id).await.unwrap();
    assert_eq!(forward[0].confidence_score, Confidence::new(64));
    assert_eq!(bed.store.notifications().len(), 4);
}

#[tokio::test]
async fn test_low_confidence_match_is_not_persisted() {
    let lost = lost_wallet(Uuid::new_v4());
    let found = found_wallet(Uuid::new_v4());
    let bed = TestBed::new(
        Arc::new(MockEmbedder::disabled()),
        None,
        scripted_scores(found.id, &[25]),
    );
    let lost = bed.insert(lost).await;
    bed.insert(found).await;

    bed.service.trigger_matching(lost.id).await.unwrap();
    bed.run_jobs().await;

    assert_eq!(bed.llm.call_count(), 1);
    assert!(bed.store.all_matches().is_empty());
    assert!(bed.store.notifications().is_empty());
}

#[tokio::test]
async fn test_recency_path_without_vector_index() {
    let lost = lost_wallet(Uuid::new_v4());
    let found = found_wallet(Uuid::new_v4());
    let embedder = Arc::new(MockEmbedder::new());
    let bed = TestBed::new(embedder.clone(), None, scripted_scores(found.id, &[72]));
    let lost = bed.insert(lost).await;
    let found = bed.insert(found).await;
    // Same owner and same status items never become candidates.
    bed.insert(found_wallet(lost.owner_id)).await;
    bed.insert(lost_wallet(Uuid::new_v4())).await;

    bed.service.trigger_matching(lost.id).await.unwrap();
    bed.run_jobs().await;

    assert_eq!(embedder.calls(), 0);
    let prompt = bed.llm.requests()[0].user_text();
    assert!(!prompt.contains("Text similarity"));
    assert_eq!(prompt.matches("--- candidate_id:").count(), 1);
    let forward = bed.service.get_potential_matches(lost.id).await.unwrap();
    assert_eq!(forward.len(), 1);
    assert_eq!(forward[0].matched_item_id, found.id);
}

#[tokio::test]
async fn test_matching_is_skipped_without_language_model() {
    let lost = lost_wallet(Uuid::new_v4());
    let embedder = Arc::new(MockEmbedder::new());
    let index = Arc::new(MockItemIndex::new());
    let bed = TestBed::new(
        embedder.clone(),
        Some(index.clone() as Arc<dyn ItemIndex>),
        MockChatProvider::disabled(),
    );
    let lost = bed.insert(lost).await;
    bed.insert(found_wallet(Uuid::new_v4())).await;

    bed.service.trigger_matching(lost.id).await.unwrap();
    bed.run_jobs().await;

    assert_eq!(embedder.calls(), 0);
    assert_eq!(index.point_count(), 0);
    assert_eq!(bed.llm.call_count(), 0);
    assert!(bed.store.all_matches().is_empty());
}

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};

use super::error::MatchingError;
use super::types::{MatchingConfig, ScoredMatch};
use crate::model::{Item, MatchEdge, NewNotification, NotificationKind};
use crate::store::Store;

/// Writes accepted matches as two directed rows and notifies both owners.
///
/// The two upserts are independent writes. A failure between them leaves
/// only the forward row visible until the next run's upsert repairs the
/// pair. Notifications are sent on every run, including re-scores.
pub struct MatchPersistence {
    store: Arc<dyn Store>,
    config: MatchingConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistOutcome {
    pub persisted: usize,
    pub notifications: usize,
}

impl MatchPersistence {
    pub fn new(store: Arc<dyn Store>, config: MatchingConfig) -> Self {
        Self { store, config }
    }

    pub async fn persist(
        &self,
        source: &Item,
        matches: &[ScoredMatch],
    ) -> Result<PersistOutcome, MatchingError> {
        let mut outcome = PersistOutcome::default();

        for scored in matches {
            if scored.confidence < self.config.min_confidence {
                debug!(
                    matched_item_id = %scored.candidate.id,
                    confidence = %scored.confidence,
                    "Skipping match below threshold"
                );
                continue;
            }

            let edge = MatchEdge::new(
                source.id,
                scored.candidate.id,
                scored.confidence,
                scored.reasoning.clone(),
            );
            self.store.upsert_match(&edge).await?;
            self.store.upsert_match(&edge.mirrored()).await?;
            outcome.persisted += 1;

            for notification in match_notifications(source, scored) {
                self.store.insert_notification(notification).await?;
                outcome.notifications += 1;
            }

            info!(
                item_id = %source.id,
                matched_item_id = %scored.candidate.id,
                confidence = %scored.confidence,
                "Persisted match"
            );
        }

        Ok(outcome)
    }
}

/// One notification per owner, each pointing at that owner's own item.
fn match_notifications(source: &Item, scored: &ScoredMatch) -> [NewNotification; 2] {
    let matched = &scored.candidate;
    let notify = |owned: &Item, other: &Item| NewNotification {
        user_id: owned.owner_id,
        kind: NotificationKind::MatchFound,
        title: "Potential match found".to_string(),
        message: format!(
            "Your {} item \"{}\" may match a {} item: \"{}\" ({}% confidence).",
            owned.status, owned.title, other.status, other.title, scored.confidence
        ),
        link: format!("/items/{}", owned.id),
        metadata: json!({
            "item_id": owned.id,
            "matched_item_id": other.id,
            "confidence_score": scored.confidence,
        }),
    };

    [notify(source, matched), notify(matched, source)]
}

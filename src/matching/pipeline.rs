use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use super::error::MatchingError;
use super::persistence::MatchPersistence;
use super::retriever::CandidateRetriever;
use super::scorer::MatchScorer;
use super::types::MatchRunSummary;
use crate::store::Store;

/// Retrieve, score and persist matches for one item.
pub struct MatchingPipeline {
    store: Arc<dyn Store>,
    retriever: CandidateRetriever,
    scorer: MatchScorer,
    persistence: MatchPersistence,
}

impl MatchingPipeline {
    pub fn new(
        store: Arc<dyn Store>,
        retriever: CandidateRetriever,
        scorer: MatchScorer,
        persistence: MatchPersistence,
    ) -> Self {
        Self {
            store,
            retriever,
            scorer,
            persistence,
        }
    }

    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn run_for_item(&self, item_id: Uuid) -> Result<MatchRunSummary, MatchingError> {
        let item = self
            .store
            .get_item(item_id)
            .await?
            .ok_or(MatchingError::ItemNotFound { item_id })?;

        if !item.is_matchable() {
            info!("Item is inactive or resolved; skipping matching");
            return Ok(MatchRunSummary::skipped("item not matchable"));
        }

        // No scorer means no matches, so don't spend embedding calls either.
        if !self.scorer.is_enabled() {
            info!("Scoring provider not configured; skipping matching");
            return Ok(MatchRunSummary::skipped("scoring provider not configured"));
        }

        let (strategy, candidates) = self.retriever.find_candidates(&item).await?;
        if candidates.is_empty() {
            return Ok(MatchRunSummary {
                strategy,
                ..Default::default()
            });
        }

        let scored = self.scorer.score(&item, &candidates).await;
        let outcome = self.persistence.persist(&item, &scored).await?;

        Ok(MatchRunSummary {
            strategy,
            candidates: candidates.len(),
            persisted: outcome.persisted,
            notifications: outcome.notifications,
            skipped: None,
        })
    }
}

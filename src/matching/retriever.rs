use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::error::MatchingError;
use super::types::{Candidate, MatchingConfig, RetrievalStrategy};
use crate::embedding::{Embedder, embedding_text};
use crate::model::Item;
use crate::store::{RecentItemsQuery, Store};
use crate::vectordb::{IndexedItem, ItemIndex, SimilarityQuery};

/// Finds opposite-status candidates for an item.
///
/// The vector path runs whenever an embedder key and an index are
/// configured. Whenever it yields nothing (provider error, index error, or
/// simply no hit above the threshold) the recency scan takes over.
pub struct CandidateRetriever {
    embedder: Arc<dyn Embedder>,
    index: Option<Arc<dyn ItemIndex>>,
    store: Arc<dyn Store>,
    config: MatchingConfig,
}

impl CandidateRetriever {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Option<Arc<dyn ItemIndex>>,
        store: Arc<dyn Store>,
        config: MatchingConfig,
    ) -> Self {
        Self {
            embedder,
            index,
            store,
            config,
        }
    }

    pub fn vector_path_enabled(&self) -> bool {
        self.embedder.is_enabled() && self.index.is_some()
    }

    pub async fn find_candidates(
        &self,
        item: &Item,
    ) -> Result<(RetrievalStrategy, Vec<Candidate>), MatchingError> {
        if let Some(index) = self.index.as_deref()
            && self.embedder.is_enabled()
        {
            let candidates = self.vector_candidates(index, item).await?;
            if !candidates.is_empty() {
                info!(
                    item_id = %item.id,
                    candidates = candidates.len(),
                    "Vector retrieval found candidates"
                );
                return Ok((RetrievalStrategy::Vector, candidates));
            }
            debug!(item_id = %item.id, "Vector retrieval empty; falling back to recency scan");
        }

        let candidates = self.recent_candidates(item).await?;
        let strategy = if candidates.is_empty() {
            RetrievalStrategy::None
        } else {
            RetrievalStrategy::Recency
        };
        info!(
            item_id = %item.id,
            candidates = candidates.len(),
            "Recency scan found candidates"
        );
        Ok((strategy, candidates))
    }

    /// Embeds the item (or reuses its stored vector), stores and indexes it,
    /// then searches. Provider and index failures degrade to an empty list;
    /// only store failures propagate.
    async fn vector_candidates(
        &self,
        index: &dyn ItemIndex,
        item: &Item,
    ) -> Result<Vec<Candidate>, MatchingError> {
        let vector = match &item.embedding {
            Some(existing) if !existing.is_empty() => existing.clone(),
            _ => match self.embedder.embed(&embedding_text(item)).await {
                Ok(vector) => {
                    self.store.set_item_embedding(item.id, &vector).await?;
                    vector
                }
                Err(e) => {
                    warn!(item_id = %item.id, error = %e, "Embedding failed");
                    return Ok(Vec::new());
                }
            },
        };

        if let Err(e) = index
            .upsert_item(IndexedItem::from_item(item, vector.clone()))
            .await
        {
            warn!(item_id = %item.id, error = %e, "Failed to index item vector");
        }

        let hits = match index
            .search_similar(SimilarityQuery {
                vector,
                status: item.status.opposite(),
                exclude_owner: item.owner_id,
                exclude_item: Some(item.id),
                score_threshold: self.config.similarity_threshold,
                limit: self.config.vector_limit,
            })
            .await
        {
            Ok(hits) => hits,
            Err(e) => {
                warn!(item_id = %item.id, error = %e, "Vector search failed");
                return Ok(Vec::new());
            }
        };
        if hits.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<_> = hits.iter().map(|h| h.item_id).collect();
        let mut rows: HashMap<_, _> = self
            .store
            .get_items(&ids)
            .await?
            .into_iter()
            .map(|i| (i.id, i))
            .collect();

        // The index can lag behind the store; re-check eligibility.
        Ok(hits
            .into_iter()
            .filter_map(|hit| {
                let candidate = rows.remove(&hit.item_id)?;
                is_eligible(item, &candidate).then_some(Candidate {
                    item: candidate,
                    similarity: Some(hit.similarity),
                })
            })
            .collect())
    }

    async fn recent_candidates(&self, item: &Item) -> Result<Vec<Candidate>, MatchingError> {
        let rows = self
            .store
            .recent_items(RecentItemsQuery {
                status: item.status.opposite(),
                exclude_owner: item.owner_id,
                exclude_item: item.id,
                limit: self.config.fallback_limit,
            })
            .await?;

        Ok(rows
            .into_iter()
            .filter(|candidate| is_eligible(item, candidate))
            .map(|candidate| Candidate {
                item: candidate,
                similarity: None,
            })
            .collect())
    }
}

fn is_eligible(source: &Item, candidate: &Item) -> bool {
    candidate.id != source.id
        && candidate.status == source.status.opposite()
        && candidate.owner_id != source.owner_id
        && candidate.is_matchable()
}

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::ItemIndex;
use super::error::VectorDbError;
use super::model::{IndexedItem, SimilarItem, SimilarityQuery};

const MOCK_COLLECTION: &str = "mock_items";

/// In-memory index with exact cosine search.
#[derive(Default)]
pub struct MockItemIndex {
    points: RwLock<HashMap<Uuid, IndexedItem>>,
    failing: AtomicBool,
}

impl MockItemIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent search fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn point_count(&self) -> usize {
        self.points.read().len()
    }

    pub fn get(&self, item_id: &Uuid) -> Option<IndexedItem> {
        self.points.read().get(item_id).cloned()
    }
}

#[async_trait]
impl ItemIndex for MockItemIndex {
    async fn ensure_collection(&self) -> Result<(), VectorDbError> {
        Ok(())
    }

    async fn upsert_item(&self, item: IndexedItem) -> Result<(), VectorDbError> {
        let mut points = self.points.write();
        if let Some(existing) = points.values().find(|p| p.item_id != item.item_id)
            && existing.vector.len() != item.vector.len()
        {
            return Err(VectorDbError::InvalidDimension {
                expected: existing.vector.len(),
                actual: item.vector.len(),
            });
        }
        points.insert(item.item_id, item);
        Ok(())
    }

    async fn search_similar(
        &self,
        query: SimilarityQuery,
    ) -> Result<Vec<SimilarItem>, VectorDbError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(VectorDbError::SearchFailed {
                collection: MOCK_COLLECTION.to_string(),
                message: "mock index unavailable".to_string(),
            });
        }

        let points = self.points.read();
        let mut results: Vec<SimilarItem> = points
            .values()
            .filter(|p| p.active && p.status == query.status)
            .filter(|p| p.owner_id != query.exclude_owner)
            .filter(|p| Some(p.item_id) != query.exclude_item)
            .map(|p| SimilarItem {
                item_id: p.item_id,
                similarity: cosine_similarity(&query.vector, &p.vector),
            })
            .filter(|hit| hit.similarity >= query.score_threshold)
            .collect();

        results.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(query.limit as usize);
        Ok(results)
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

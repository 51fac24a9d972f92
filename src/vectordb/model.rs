use std::collections::HashMap;

use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::{ScoredPoint, Value};
use uuid::Uuid;

use crate::model::{Item, ItemStatus};

/// Payload keys stored alongside each point.
pub(crate) const ITEM_ID_KEY: &str = "item_id";
pub(crate) const OWNER_ID_KEY: &str = "owner_id";
pub(crate) const STATUS_KEY: &str = "status";
pub(crate) const ACTIVE_KEY: &str = "active";

/// One item's vector plus the fields search filters on.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedItem {
    pub item_id: Uuid,
    pub owner_id: Uuid,
    pub status: ItemStatus,
    pub active: bool,
    pub vector: Vec<f32>,
}

impl IndexedItem {
    pub fn from_item(item: &Item, vector: Vec<f32>) -> Self {
        Self {
            item_id: item.id,
            owner_id: item.owner_id,
            status: item.status,
            active: item.is_matchable(),
            vector,
        }
    }

    pub(crate) fn payload(&self) -> HashMap<String, Value> {
        let mut payload: HashMap<String, Value> = HashMap::new();
        payload.insert(ITEM_ID_KEY.to_string(), self.item_id.to_string().into());
        payload.insert(OWNER_ID_KEY.to_string(), self.owner_id.to_string().into());
        payload.insert(STATUS_KEY.to_string(), self.status.as_str().into());
        payload.insert(ACTIVE_KEY.to_string(), self.active.into());
        payload
    }
}

/// Search restricted to active items of `status`, excluding `exclude_owner`.
#[derive(Debug, Clone)]
pub struct SimilarityQuery {
    pub vector: Vec<f32>,
    pub status: ItemStatus,
    pub exclude_owner: Uuid,
    pub exclude_item: Option<Uuid>,
    pub score_threshold: f32,
    pub limit: u64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarItem {
    pub item_id: Uuid,
    /// Cosine similarity on a 0-1 scale.
    pub similarity: f32,
}

impl SimilarItem {
    pub fn from_scored_point(point: ScoredPoint) -> Option<Self> {
        let id = match point.id.and_then(|pid| pid.point_id_options) {
            Some(PointIdOptions::Uuid(raw)) => Uuid::parse_str(&raw).ok(),
            _ => None,
        };

        // Older points may only carry the id in their payload.
        let item_id = id.or_else(|| {
            point
                .payload
                .get(ITEM_ID_KEY)
                .and_then(|v| v.as_str())
                .and_then(|s| Uuid::parse_str(s).ok())
        })?;

        Some(Self {
            item_id,
            similarity: point.score,
        })
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::confidence::Confidence;

/// One directed row of a match between two items.
///
/// Every match is stored twice (A->B and B->A) so "matches for X" is a
/// single-column lookup. `is_dismissed` belongs to the row's viewer only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotentialMatch {
    pub id: Uuid,
    pub item_id: Uuid,
    pub matched_item_id: Uuid,
    pub confidence_score: Confidence,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default)]
    pub is_dismissed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Write payload for one direction of a match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchEdge {
    pub item_id: Uuid,
    pub matched_item_id: Uuid,
    pub confidence_score: Confidence,
    pub reasoning: String,
}

impl MatchEdge {
    pub fn new(
        item_id: Uuid,
        matched_item_id: Uuid,
        confidence: Confidence,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            item_id,
            matched_item_id,
            confidence_score: confidence,
            reasoning: reasoning.into(),
        }
    }

    /// The same edge seen from the other item.
    pub fn mirrored(&self) -> Self {
        Self {
            item_id: self.matched_item_id,
            matched_item_id: self.item_id,
            confidence_score: self.confidence_score,
            reasoning: self.reasoning.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    MatchFound,
    ClaimApproved,
    ClaimRejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNotification {
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub link: String,
    #[serde(default)]
    pub metadata: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub link: String,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn from_new(new: NewNotification) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            kind: new.kind,
            title: new.title,
            message: new.message,
            link: new.link,
            metadata: new.metadata,
            is_read: false,
            created_at: Utc::now(),
        }
    }
}

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Lost,
    Found,
}

impl ItemStatus {
    /// Lost items match against found items and vice versa.
    pub fn opposite(self) -> Self {
        match self {
            ItemStatus::Lost => ItemStatus::Found,
            ItemStatus::Found => ItemStatus::Lost,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Lost => "lost",
            ItemStatus::Found => "found",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lost" => Ok(Self::Lost),
            "found" => Ok(Self::Found),
            other => Err(format!("unknown item status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionStatus {
    #[default]
    None,
    Pending,
    Confirmed,
}

/// Where an item was lost or found.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Free-text description ("near the north entrance of Central Station").
    #[serde(rename = "location", default)]
    pub text: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl Location {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_city_state(mut self, city: impl Into<String>, state: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self.state = Some(state.into());
        self
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// `"City, State"`, `"City"`, `"State"` or `None` when neither is set.
    pub fn city_state(&self) -> Option<String> {
        let parts: Vec<&str> = [self.city.as_deref(), self.state.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(", "))
        }
    }
}

/// A reported lost or found item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    #[serde(rename = "user_id")]
    pub owner_id: Uuid,
    pub status: ItemStatus,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(flatten)]
    pub location: Location,
    #[serde(rename = "date_lost_found", default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub ai_tags: Vec<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_embedding",
        skip_serializing_if = "Option::is_none"
    )]
    pub embedding: Option<Vec<f32>>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub resolution_status: ResolutionStatus,
    #[serde(default)]
    pub resolution_requested_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolved_claim_id: Option<Uuid>,
    #[serde(default)]
    pub linked_item_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

/// pgvector columns come back from PostgREST as `"[0.1,0.2,...]"` strings.
fn deserialize_embedding<'de, D>(deserializer: D) -> Result<Option<Vec<f32>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Vector(Vec<f32>),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Vector(v)) => Ok(Some(v)),
        Some(Raw::Text(s)) => serde_json::from_str::<Vec<f32>>(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

impl Item {
    /// Creates an active, unresolved item posted now.
    pub fn new(
        owner_id: Uuid,
        status: ItemStatus,
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id,
            status,
            title: title.into(),
            description: description.into(),
            category: category.into(),
            location,
            date: None,
            image_url: None,
            ai_tags: Vec::new(),
            embedding: None,
            is_active: true,
            resolution_status: ResolutionStatus::None,
            resolution_requested_at: None,
            resolved_at: None,
            resolved_claim_id: None,
            linked_item_id: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ai_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Active items that have not been resolved are eligible as candidates.
    pub fn is_matchable(&self) -> bool {
        self.is_active && self.resolution_status != ResolutionStatus::Confirmed
    }
}

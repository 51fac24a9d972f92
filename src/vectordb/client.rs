use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, Distance, Filter, PointStruct, SearchPointsBuilder,
    UpsertPointsBuilder, VectorParamsBuilder,
};
use tracing::{debug, info};

use super::ItemIndex;
use super::error::VectorDbError;
use super::model::{
    ACTIVE_KEY, ITEM_ID_KEY, IndexedItem, OWNER_ID_KEY, STATUS_KEY, SimilarItem, SimilarityQuery,
};

#[derive(Clone)]
/// Qdrant-backed [`ItemIndex`]; point ids are the item UUIDs.
pub struct QdrantItemIndex {
    client: Qdrant,
    url: String,
    collection: String,
    vector_size: u64,
}

impl QdrantItemIndex {
    pub fn new(
        url: &str,
        api_key: Option<&str>,
        collection: impl Into<String>,
        vector_size: u64,
    ) -> Result<Self, VectorDbError> {
        let mut builder = Qdrant::from_url(url);
        if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
            builder = builder.api_key(key);
        }
        let client = builder
            .build()
            .map_err(|e| VectorDbError::ConnectionFailed {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            url: url.to_string(),
            collection: collection.into(),
            vector_size,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Performs a basic health check request.
    pub async fn health_check(&self) -> Result<(), VectorDbError> {
        self.client
            .health_check()
            .await
            .map_err(|e| VectorDbError::ConnectionFailed {
                url: self.url.clone(),
                message: e.to_string(),
            })?;
        Ok(())
    }

    fn search_filter(query: &SimilarityQuery) -> Filter {
        let mut must_not = vec![Condition::matches(
            OWNER_ID_KEY,
            query.exclude_owner.to_string(),
        )];
        if let Some(item_id) = query.exclude_item {
            must_not.push(Condition::matches(ITEM_ID_KEY, item_id.to_string()));
        }

        Filter {
            must: vec![
                Condition::matches(STATUS_KEY, query.status.as_str().to_string()),
                Condition::matches(ACTIVE_KEY, true),
            ],
            must_not,
            ..Default::default()
        }
    }
}

#[async_trait]
impl ItemIndex for QdrantItemIndex {
    async fn ensure_collection(&self) -> Result<(), VectorDbError> {
        let exists = self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(|e| VectorDbError::CreateCollectionFailed {
                collection: self.collection.clone(),
                message: e.to_string(),
            })?;

        if !exists {
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection).vectors_config(
                        VectorParamsBuilder::new(self.vector_size, Distance::Cosine),
                    ),
                )
                .await
                .map_err(|e| VectorDbError::CreateCollectionFailed {
                    collection: self.collection.clone(),
                    message: e.to_string(),
                })?;
            info!(
                collection = %self.collection,
                vector_size = self.vector_size,
                "Created item collection"
            );
        }

        Ok(())
    }

    async fn upsert_item(&self, item: IndexedItem) -> Result<(), VectorDbError> {
        if item.vector.len() as u64 != self.vector_size {
            return Err(VectorDbError::InvalidDimension {
                expected: self.vector_size as usize,
                actual: item.vector.len(),
            });
        }

        let payload = item.payload();
        let point = PointStruct::new(item.item_id.to_string(), item.vector, payload);

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, vec![point]).wait(true))
            .await
            .map_err(|e| VectorDbError::UpsertFailed {
                collection: self.collection.clone(),
                message: e.to_string(),
            })?;

        debug!(item_id = %item.item_id, "Indexed item vector");
        Ok(())
    }

    async fn search_similar(
        &self,
        query: SimilarityQuery,
    ) -> Result<Vec<SimilarItem>, VectorDbError> {
        let filter = Self::search_filter(&query);
        let search = SearchPointsBuilder::new(&self.collection, query.vector, query.limit)
            .filter(filter)
            .score_threshold(query.score_threshold)
            .with_payload(true);

        let response = self.client.search_points(search).await.map_err(|e| {
            VectorDbError::SearchFailed {
                collection: self.collection.clone(),
                message: e.to_string(),
            }
        })?;

        Ok(response
            .result
            .into_iter()
            .filter_map(SimilarItem::from_scored_point)
            .collect())
    }
}

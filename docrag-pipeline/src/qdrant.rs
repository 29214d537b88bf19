//! Qdrant vector store backend.
//!
//! Provides [`QdrantStore`] which implements [`VectorStore`] over gRPC using
//! the [qdrant-client](https://docs.rs/qdrant-client) crate. The store binds
//! to one collection: construction connects, creates the collection with
//! cosine distance when absent, and verifies the dimension when present.
//!
//! # Example
//!
//! ```rust,ignore
//! use docrag_pipeline::QdrantStore;
//!
//! let store = QdrantStore::connect("http://localhost:6334", "docs", 3072, timeout).await?;
//! store.upsert(&points).await?;
//! let outcome = store.search(&query_vector, 5).await?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder, UpsertPointsBuilder,
    Value as QdrantValue, VectorParamsBuilder, vectors_config,
};
use qdrant_client::{Payload, Qdrant, QdrantError};
use tracing::{debug, error, info, warn};

use docrag_core::{CollectionStats, RagError, Result, RetryPolicy, SearchOutcome};

use crate::vectorstore::{Point, PointPayload, VectorStore, collect_outcome};

/// A [`VectorStore`] backed by [Qdrant](https://qdrant.tech/).
pub struct QdrantStore {
    client: Qdrant,
    collection: String,
    dimensions: usize,
    retry: RetryPolicy,
}

/// Response and transport errors can resolve on a later attempt; anything
/// else (bad URI, conversion failures) will not.
fn qdrant_error_is_transient(err: &QdrantError) -> bool {
    matches!(err, QdrantError::ResponseError { .. } | QdrantError::Io(_))
}

/// Extract a string from a Qdrant payload value, defaulting to empty.
fn extract_string(value: Option<&QdrantValue>) -> String {
    match value.and_then(|v| v.kind.as_ref()) {
        Some(Kind::StringValue(s)) => s.clone(),
        _ => String::new(),
    }
}

fn to_point_struct(point: &Point) -> PointStruct {
    let mut payload_map = serde_json::Map::new();
    payload_map.insert(
        "source".to_string(),
        serde_json::Value::String(point.payload.source.clone()),
    );
    payload_map.insert(
        "text".to_string(),
        serde_json::Value::String(point.payload.text.clone()),
    );
    let payload = Payload::try_from(serde_json::Value::Object(payload_map)).unwrap_or_default();

    PointStruct::new(point.id.clone(), point.vector.clone(), payload)
}

impl QdrantStore {
    /// Connect to Qdrant and bind to `collection`, creating it with cosine
    /// distance if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorDb`] tagged `connect` or
    /// `create_collection` when the backend is unreachable or creation
    /// fails, and [`RagError::Configuration`] when the collection already
    /// exists with a different dimension.
    pub async fn connect(
        url: &str,
        collection: impl Into<String>,
        dimensions: usize,
        timeout: Duration,
    ) -> Result<Self> {
        let collection = collection.into();
        let client = Qdrant::from_url(url).timeout(timeout).build().map_err(|e| {
            error!(url, error = %e, "failed to build qdrant client");
            RagError::VectorDb {
                operation: "connect",
                collection: collection.clone(),
                message: e.to_string(),
                transient: false,
            }
        })?;

        let store = Self {
            client,
            collection,
            dimensions,
            retry: RetryPolicy::store(),
        };
        store.ensure_collection().await?;
        Ok(store)
    }

    fn store_error(&self, operation: &'static str, err: QdrantError) -> RagError {
        RagError::VectorDb {
            operation,
            collection: self.collection.clone(),
            message: err.to_string(),
            transient: qdrant_error_is_transient(&err),
        }
    }

    async fn ensure_collection(&self) -> Result<()> {
        let collections = self
            .client
            .list_collections()
            .await
            .map_err(|e| self.store_error("connect", e))?;
        let exists = collections
            .collections
            .iter()
            .any(|c| c.name == self.collection);

        if !exists {
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection).vectors_config(
                        VectorParamsBuilder::new(self.dimensions as u64, Distance::Cosine),
                    ),
                )
                .await
                .map_err(|e| self.store_error("create_collection", e))?;
            info!(
                collection = %self.collection,
                dimensions = self.dimensions,
                "created collection"
            );
            return Ok(());
        }

        // Never adopt a collection whose schema disagrees with the embedder.
        if let Some(size) = self.existing_vector_size().await? {
            if size != self.dimensions as u64 {
                return Err(RagError::Configuration {
                    message: format!(
                        "collection '{}' stores {size}-dimension vectors but the embedder produces {}",
                        self.collection, self.dimensions
                    ),
                });
            }
        }
        debug!(collection = %self.collection, "collection already exists");
        Ok(())
    }

    async fn existing_vector_size(&self) -> Result<Option<u64>> {
        let response = self
            .client
            .collection_info(self.collection.as_str())
            .await
            .map_err(|e| self.store_error("connect", e))?;

        Ok(response
            .result
            .and_then(|info| info.config)
            .and_then(|config| config.params)
            .and_then(|params| params.vectors_config)
            .and_then(|vectors| vectors.config)
            .and_then(|config| match config {
                vectors_config::Config::Params(params) => Some(params.size),
                _ => None,
            }))
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn upsert(&self, points: &[Point]) -> Result<usize> {
        if points.is_empty() {
            return Ok(0);
        }

        let batch: Vec<PointStruct> = points.iter().map(to_point_struct).collect();
        self.retry
            .run("upsert", || {
                let batch = batch.clone();
                async move {
                    self.client
                        .upsert_points(
                            UpsertPointsBuilder::new(self.collection.clone(), batch).wait(true),
                        )
                        .await
                        .map_err(|e| self.store_error("upsert", e))
                }
            })
            .await?;

        debug!(collection = %self.collection, count = points.len(), "upserted points");
        Ok(points.len())
    }

    async fn search(&self, query_vector: &[f32], top_k: usize) -> Result<SearchOutcome> {
        let response = self
            .retry
            .run("search", || {
                let request = SearchPointsBuilder::new(
                    self.collection.clone(),
                    query_vector.to_vec(),
                    top_k as u64,
                )
                .with_payload(true);
                async move {
                    self.client
                        .search_points(request)
                        .await
                        .map_err(|e| RagError::Search {
                            message: format!("search in '{}' failed: {e}", self.collection),
                            transient: qdrant_error_is_transient(&e),
                        })
                }
            })
            .await?;

        let outcome = collect_outcome(response.result.into_iter().map(|scored| PointPayload {
            source: extract_string(scored.payload.get("source")),
            text: extract_string(scored.payload.get("text")),
        }));
        debug!(
            collection = %self.collection,
            contexts = outcome.contexts.len(),
            "search completed"
        );
        Ok(outcome)
    }

    async fn health_check(&self) -> bool {
        match self.client.list_collections().await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "qdrant health check failed");
                false
            }
        }
    }

    async fn collection_info(&self) -> CollectionStats {
        match self.client.collection_info(self.collection.as_str()).await {
            Ok(response) => {
                let info = response.result;
                CollectionStats {
                    name: self.collection.clone(),
                    status: info
                        .as_ref()
                        .map(|i| format!("{:?}", i.status()).to_lowercase())
                        .unwrap_or_else(|| "unknown".into()),
                    points_count: info.as_ref().and_then(|i| i.points_count),
                    // Current qdrant-client collection info carries no total
                    // vector count; the field stays absent for this backend.
                    vectors_count: None,
                    error: None,
                }
            }
            Err(e) => CollectionStats::unavailable(self.collection.clone(), e.to_string()),
        }
    }

    async fn delete_collection(&self) -> bool {
        warn!(collection = %self.collection, "deleting collection");
        match self
            .client
            .delete_collection(self.collection.as_str())
            .await
        {
            Ok(response) => response.result,
            Err(e) => {
                error!(collection = %self.collection, error = %e, "failed to delete collection");
                false
            }
        }
    }

    fn backend(&self) -> &'static str {
        "qdrant"
    }
}

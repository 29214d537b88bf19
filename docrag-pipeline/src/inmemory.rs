//! In-memory vector store using cosine similarity.
//!
//! [`InMemoryStore`] keeps points in a `HashMap` behind a
//! `tokio::sync::RwLock`. It backs tests and local development runs where a
//! Qdrant instance would be overkill.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::warn;

use docrag_core::{CollectionStats, Result, SearchOutcome};

use crate::vectorstore::{Point, VectorStore, collect_outcome};

/// An in-memory [`VectorStore`] bound to a single named collection.
#[derive(Debug)]
pub struct InMemoryStore {
    collection: String,
    points: RwLock<HashMap<String, Point>>,
}

impl InMemoryStore {
    /// Create an empty store for the given collection name.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            points: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored points.
    pub async fn len(&self) -> usize {
        self.points.read().await.len()
    }

    /// Whether the store holds no points.
    pub async fn is_empty(&self) -> bool {
        self.points.read().await.is_empty()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn upsert(&self, points: &[Point]) -> Result<usize> {
        if points.is_empty() {
            return Ok(0);
        }
        let mut stored = self.points.write().await;
        for point in points {
            stored.insert(point.id.clone(), point.clone());
        }
        Ok(points.len())
    }

    async fn search(&self, query_vector: &[f32], top_k: usize) -> Result<SearchOutcome> {
        let stored = self.points.read().await;

        let mut scored: Vec<(f32, &Point)> = stored
            .values()
            .map(|point| (cosine_similarity(&point.vector, query_vector), point))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        Ok(collect_outcome(
            scored.into_iter().map(|(_, point)| point.payload.clone()),
        ))
    }

    async fn health_check(&self) -> bool {
        true
    }

    async fn collection_info(&self) -> CollectionStats {
        let count = self.points.read().await.len() as u64;
        CollectionStats {
            name: self.collection.clone(),
            status: "green".into(),
            points_count: Some(count),
            vectors_count: Some(count),
            error: None,
        }
    }

    async fn delete_collection(&self) -> bool {
        warn!(collection = %self.collection, "deleting collection");
        self.points.write().await.clear();
        true
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

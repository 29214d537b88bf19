//! Vector store trait and point types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use docrag_core::{CollectionStats, Result, SearchOutcome};

/// Default number of neighbors retrieved by a search.
pub const DEFAULT_TOP_K: usize = 5;

/// Payload stored alongside every vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointPayload {
    /// Identifier of the originating document.
    pub source: String,
    /// Chunk text. Search skips points where this is empty.
    pub text: String,
}

/// One vector with its id and payload. Ids are strings so deterministic
/// UUIDs can be used for overwrite-on-reingest semantics.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: PointPayload,
}

/// A storage backend managing one collection of [`Point`]s.
///
/// Implementations encapsulate a single named collection against a single
/// endpoint: the collection is chosen at construction, not per call.
///
/// # Example
///
/// ```rust,ignore
/// use docrag_pipeline::{InMemoryStore, VectorStore};
///
/// let store = InMemoryStore::new("docs");
/// store.upsert(&points).await?;
/// let outcome = store.search(&query_vector, 5).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Write points in one batch, overwriting any existing point sharing an
    /// id. Returns the number of points written. Empty input returns 0
    /// without touching the backend.
    async fn upsert(&self, points: &[Point]) -> Result<usize>;

    /// Nearest-neighbor search limited to `top_k` results. Points with a
    /// non-empty `text` payload contribute to the outcome in rank order;
    /// points with empty text are skipped.
    async fn search(&self, query_vector: &[f32], top_k: usize) -> Result<SearchOutcome>;

    /// Cheap liveness probe. Never errors; failures report as `false`.
    async fn health_check(&self) -> bool;

    /// Diagnostic counts and status for the collection. Never errors;
    /// failures are reported inside the stats payload.
    async fn collection_info(&self) -> CollectionStats;

    /// Best-effort removal of the collection and its data. Never errors.
    async fn delete_collection(&self) -> bool;

    /// Short backend name for health reporting.
    fn backend(&self) -> &'static str;
}

/// Fold ranked payloads into a [`SearchOutcome`]: texts in rank order,
/// sources deduplicated in order of first appearance, empty-text points
/// skipped entirely.
pub fn collect_outcome<I>(payloads: I) -> SearchOutcome
where
    I: IntoIterator<Item = PointPayload>,
{
    let mut outcome = SearchOutcome::default();
    for payload in payloads {
        if payload.text.is_empty() {
            continue;
        }
        if !outcome.sources.contains(&payload.source) {
            outcome.sources.push(payload.source);
        }
        outcome.contexts.push(payload.text);
    }
    outcome
}

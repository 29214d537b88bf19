//! Types that flow between pipeline steps.
//!
//! Step outputs are recorded in a ledger and replayed on re-entry, so every
//! type here is serializable and round-trips through JSON unchanged.

use serde::{Deserialize, Serialize};

/// Chunks extracted from one source document, in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkSet {
    /// Identifier of the originating document.
    pub source_id: String,
    /// Ordered, non-empty text chunks.
    pub chunks: Vec<String>,
}

/// Outcome of an ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertReceipt {
    /// Number of points written to the store.
    pub ingested: usize,
}

/// Retrieved context texts with their originating sources.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// Context texts in rank order.
    pub contexts: Vec<String>,
    /// Source ids, deduplicated, in order of first appearance.
    pub sources: Vec<String>,
}

/// Final answer produced by the query pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub answer: String,
    /// Sources backing the answer, as returned by retrieval.
    pub sources: Vec<String>,
    /// How many retrieved contexts went into the prompt.
    pub num_contexts: usize,
}

/// Diagnostic snapshot of a collection. When the backend cannot be reached
/// `error` is populated instead of failing the caller; health reporting must
/// degrade, not break.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionStats {
    pub name: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vectors_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CollectionStats {
    /// Stats for a collection that could not be inspected.
    pub fn unavailable(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: "unknown".into(),
            points_count: None,
            vectors_count: None,
            error: Some(error.into()),
        }
    }
}

//! Ingestion pipeline: load-and-chunk, then embed-and-upsert.

use std::path::Path;
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use docrag_core::{ChunkSet, Result, UpsertReceipt};

use crate::chunking::TextChunker;
use crate::embedding::Embedder;
use crate::loader::load_pdf_pages;
use crate::vectorstore::{Point, PointPayload, VectorStore};

/// Deterministic id for the chunk at `index` of `source_id`: UUID v5 over
/// the URL namespace. Re-ingesting a source produces the same ids, so the
/// upsert overwrites instead of duplicating.
pub fn point_id(source_id: &str, index: usize) -> String {
    Uuid::new_v5(
        &Uuid::NAMESPACE_URL,
        format!("{source_id}:{index}").as_bytes(),
    )
    .to_string()
}

/// The two-step ingestion pipeline: PDF file to chunks, chunks to stored
/// vector points. Each public method maps to one durable workflow step.
pub struct IngestPipeline {
    chunker: TextChunker,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl IngestPipeline {
    pub fn new(
        chunker: TextChunker,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        Self {
            chunker,
            embedder,
            store,
        }
    }

    /// Step 1: extract page texts and chunk them. `source_id` defaults to
    /// the document path when the trigger omits it.
    pub fn load_and_chunk(&self, pdf_path: &Path, source_id: Option<String>) -> Result<ChunkSet> {
        let source_id = source_id.unwrap_or_else(|| pdf_path.display().to_string());
        let pages = load_pdf_pages(pdf_path)?;
        Ok(self.chunk_pages(&pages, source_id))
    }

    /// Chunk already-extracted page texts, concatenating per-page outputs in
    /// document order.
    pub fn chunk_pages(&self, pages: &[String], source_id: impl Into<String>) -> ChunkSet {
        let source_id = source_id.into();
        let chunks = self.chunker.split_pages(pages);
        info!(source_id = %source_id, chunks = chunks.len(), "chunked document");
        ChunkSet { source_id, chunks }
    }

    /// Step 2: embed every chunk in one backend call, derive deterministic
    /// point ids, and upsert the whole batch.
    pub async fn embed_and_upsert(&self, chunk_set: &ChunkSet) -> Result<UpsertReceipt> {
        let vectors = self.embedder.embed(&chunk_set.chunks).await?;

        let points: Vec<Point> = chunk_set
            .chunks
            .iter()
            .zip(vectors)
            .enumerate()
            .map(|(index, (text, vector))| Point {
                id: point_id(&chunk_set.source_id, index),
                vector,
                payload: PointPayload {
                    source: chunk_set.source_id.clone(),
                    text: text.clone(),
                },
            })
            .collect();

        let ingested = self.store.upsert(&points).await?;
        info!(source_id = %chunk_set.source_id, ingested, "ingested document");
        Ok(UpsertReceipt { ingested })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_ids_are_deterministic_and_distinct() {
        let first = point_id("geo.pdf", 0);
        let second = point_id("geo.pdf", 0);
        assert_eq!(first, second);

        assert_ne!(point_id("geo.pdf", 0), point_id("geo.pdf", 1));
        assert_ne!(point_id("geo.pdf", 0), point_id("other.pdf", 0));
    }

    #[test]
    fn point_ids_parse_as_uuids() {
        let id = point_id("docs/report.pdf", 7);
        assert!(Uuid::parse_str(&id).is_ok());
    }
}

//! Embedding provider trait.

use async_trait::async_trait;

use docrag_core::{RagError, Result};

/// Default number of texts per request when batching.
pub const DEFAULT_EMBED_BATCH_SIZE: usize = 100;

/// A provider that converts texts into fixed-dimension vectors.
///
/// Backends implement [`embed`](Embedder::embed) as one request for the
/// whole input; the provided [`embed_batch`](Embedder::embed_batch) splits
/// oversized inputs into consecutive slices and issues one call per slice.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed every text in one backend request, returning one vector per
    /// input in input order. Empty input must return an empty `Vec` without
    /// touching the backend.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Name of the embedding model, for diagnostics.
    fn model(&self) -> &str;

    /// Dimensionality of the produced vectors.
    fn dimensions(&self) -> usize;

    /// Embed in slices of at most `batch_size` texts, concatenating results
    /// in input order. Issues `ceil(len / batch_size)` calls to
    /// [`embed`](Embedder::embed).
    async fn embed_batch(&self, texts: &[String], batch_size: usize) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let mut vectors = Vec::with_capacity(texts.len());
        for slice in texts.chunks(batch_size.max(1)) {
            vectors.extend(self.embed(slice).await?);
        }
        Ok(vectors)
    }

    /// Embed a single text.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let input = [text.to_owned()];
        let vectors = self.embed(&input).await?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| RagError::Embedding {
                model: self.model().to_owned(),
                text_count: 1,
                message: "backend returned no vector for query text".into(),
                transient: false,
            })
    }
}

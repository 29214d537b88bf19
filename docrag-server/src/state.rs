//! Shared application state handed to every request handler.

use std::sync::Arc;

use docrag_core::Result;
use docrag_pipeline::{
    ChatModel, Embedder, IngestPipeline, QueryPipeline, TextChunker, VectorStore,
};
use docrag_runner::{AdmissionGate, InMemoryLedger, StepLedger};

use crate::settings::Settings;

/// Everything a handler needs, cheaply cloneable.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: Arc<dyn VectorStore>,
    pub ingest: Arc<IngestPipeline>,
    pub query: Arc<QueryPipeline>,
    pub ledger: Arc<dyn StepLedger>,
    pub ingest_gate: Arc<AdmissionGate>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Wire the pipelines to the given backends. The store and the models
    /// are injected so tests can substitute in-memory doubles.
    pub fn new(
        settings: Arc<Settings>,
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        chat: Arc<dyn ChatModel>,
    ) -> Result<Self> {
        let chunker = TextChunker::new(settings.chunk_size, settings.chunk_overlap)?;
        let ingest = Arc::new(IngestPipeline::new(
            chunker,
            Arc::clone(&embedder),
            Arc::clone(&store),
        ));
        let query = Arc::new(QueryPipeline::new(embedder, Arc::clone(&store), chat));
        Ok(Self {
            settings,
            store,
            ingest,
            query,
            ledger: Arc::new(InMemoryLedger::new()),
            ingest_gate: Arc::new(AdmissionGate::for_ingestion()),
        })
    }
}

//! Event-triggered functions.
//!
//! Each function is a sequence of durable steps run through a
//! [`StepContext`]: a step that already completed for the same invocation is
//! replayed from the ledger instead of re-executed, so retried invocations
//! never embed or upsert twice.

use std::path::Path;

use serde::Deserialize;

use docrag_core::{QueryAnswer, Result, UpsertReceipt};
use docrag_pipeline::DEFAULT_TOP_K;
use docrag_runner::StepContext;

use crate::state::AppState;

/// Payload of an `ingest_pdf` event.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestPdfEvent {
    /// Path to the PDF on the server's filesystem.
    pub pdf_path: String,
    /// Logical document id; defaults to the path.
    pub source_id: Option<String>,
}

impl IngestPdfEvent {
    /// Key used for per-source admission control.
    pub fn admission_key(&self) -> &str {
        self.source_id.as_deref().unwrap_or(&self.pdf_path)
    }
}

/// Payload of a `query_pdf` event.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryPdfEvent {
    pub question: String,
    /// Number of contexts to retrieve; defaults to [`DEFAULT_TOP_K`].
    pub top_k: Option<usize>,
}

/// Ingest one PDF: extract and chunk, then embed and upsert.
pub async fn run_ingest_pdf(
    ctx: &StepContext,
    state: &AppState,
    event: &IngestPdfEvent,
) -> Result<UpsertReceipt> {
    let chunk_set = ctx
        .run("load-and-chunk", || async {
            state
                .ingest
                .load_and_chunk(Path::new(&event.pdf_path), event.source_id.clone())
        })
        .await?;

    ctx.run("embed-and-upsert", || async {
        state.ingest.embed_and_upsert(&chunk_set).await
    })
    .await
}

/// Answer one question: retrieve context, then ask the chat model.
pub async fn run_query_pdf(
    ctx: &StepContext,
    state: &AppState,
    event: &QueryPdfEvent,
) -> Result<QueryAnswer> {
    let top_k = event.top_k.unwrap_or(DEFAULT_TOP_K);

    let outcome = ctx
        .run("embed-and-search", || async {
            state.query.embed_and_search(&event.question, top_k).await
        })
        .await?;

    ctx.run("llm-answer", || async {
        state.query.answer(&event.question, &outcome).await
    })
    .await
}

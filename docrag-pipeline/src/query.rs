//! Query pipeline: embed-and-search, prompt assembly, answer generation.

use std::sync::Arc;

use tracing::{debug, info};

use docrag_core::{QueryAnswer, Result, SearchOutcome};

use crate::chat::ChatModel;
use crate::embedding::Embedder;
use crate::vectorstore::VectorStore;

/// System instruction constraining answers to the retrieved context.
pub const SYSTEM_PROMPT: &str = "You answer questions using only the provided context.";

/// The two-step query pipeline: question to retrieved contexts, contexts to
/// a grounded answer with source attribution.
pub struct QueryPipeline {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    chat: Arc<dyn ChatModel>,
}

impl QueryPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        chat: Arc<dyn ChatModel>,
    ) -> Self {
        Self {
            embedder,
            store,
            chat,
        }
    }

    /// Step 1: embed the question and retrieve the `top_k` nearest chunks.
    pub async fn embed_and_search(&self, question: &str, top_k: usize) -> Result<SearchOutcome> {
        let vector = self.embedder.embed_query(question).await?;
        let outcome = self.store.search(&vector, top_k).await?;
        debug!(contexts = outcome.contexts.len(), "retrieved contexts");
        Ok(outcome)
    }

    /// Assemble the user prompt: contexts as a bulleted block above the
    /// question. Zero contexts produce an empty block; the model is still
    /// asked and decides what to do with the missing evidence.
    pub fn build_prompt(contexts: &[String], question: &str) -> String {
        let context_block = contexts
            .iter()
            .map(|c| format!("- {c}"))
            .collect::<Vec<_>>()
            .join("\n\n");
        format!(
            "Use the following context to answer the question.\n\n\
             Context:\n{context_block}\n\n\
             Question: {question}\n\
             Answer concisely using the context above."
        )
    }

    /// Step 2: generate the answer from the retrieved contexts.
    pub async fn answer(&self, question: &str, outcome: &SearchOutcome) -> Result<QueryAnswer> {
        let prompt = Self::build_prompt(&outcome.contexts, question);
        let answer = self.chat.complete(SYSTEM_PROMPT, &prompt).await?;
        info!(
            num_contexts = outcome.contexts.len(),
            sources = outcome.sources.len(),
            "answered query"
        );
        Ok(QueryAnswer {
            answer: answer.trim().to_owned(),
            sources: outcome.sources.clone(),
            num_contexts: outcome.contexts.len(),
        })
    }
}

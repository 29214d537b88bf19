//! Shared in-process test doubles for pipeline tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use docrag_core::Result;
use docrag_pipeline::{ChatModel, Embedder};

/// Deterministic nonzero vector derived from the text, so identical texts
/// embed identically and any non-empty text has a usable vector.
pub fn hash_vector(text: &str) -> Vec<f32> {
    let byte_sum: f32 = text.bytes().map(|b| b as f32).sum();
    vec![
        text.len() as f32 + 1.0,
        byte_sum % 97.0,
        1.0,
        byte_sum % 13.0 + 0.5,
    ]
}

/// An [`Embedder`] that hashes texts locally and counts backend calls.
#[derive(Default)]
pub struct HashEmbedder {
    pub calls: AtomicUsize,
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| hash_vector(t)).collect())
    }

    fn model(&self) -> &str {
        "hash-embedder"
    }

    fn dimensions(&self) -> usize {
        4
    }
}

impl HashEmbedder {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// A [`ChatModel`] that records every prompt and replies with a fixed
/// answer.
pub struct RecordingChat {
    pub answer: String,
    pub prompts: Mutex<Vec<(String, String)>>,
}

impl RecordingChat {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ChatModel for RecordingChat {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        self.prompts
            .lock()
            .await
            .push((system.to_owned(), user.to_owned()));
        Ok(self.answer.clone())
    }

    fn model(&self) -> &str {
        "recording-chat"
    }
}

//! End-to-end ingest and query tests over in-process backends.

mod common;

use std::sync::Arc;

use docrag_core::ChunkSet;
use docrag_pipeline::{
    DEFAULT_EMBED_BATCH_SIZE, Embedder, IngestPipeline, InMemoryStore, Point, PointPayload,
    QueryPipeline, TextChunker, VectorStore, point_id,
};

use common::{HashEmbedder, RecordingChat, hash_vector};

fn chunk_set(source_id: &str, chunks: &[&str]) -> ChunkSet {
    ChunkSet {
        source_id: source_id.to_owned(),
        chunks: chunks.iter().map(|c| (*c).to_owned()).collect(),
    }
}

#[tokio::test]
async fn embedding_preserves_input_order() {
    let embedder = HashEmbedder::default();
    let texts: Vec<String> = ["alpha", "beta", "gamma"]
        .iter()
        .map(|t| (*t).to_owned())
        .collect();

    let vectors = embedder.embed(&texts).await.unwrap();

    assert_eq!(embedder.call_count(), 1);
    let expected: Vec<Vec<f32>> = texts.iter().map(|t| hash_vector(t)).collect();
    assert_eq!(vectors, expected);
}

#[tokio::test]
async fn embedding_empty_input_is_free() {
    let embedder = HashEmbedder::default();

    let vectors = embedder.embed(&[]).await.unwrap();

    assert!(vectors.is_empty());
    assert_eq!(embedder.call_count(), 0);
}

#[tokio::test]
async fn batched_embedding_matches_a_single_call() {
    let texts: Vec<String> = (0..10).map(|i| format!("text number {i}")).collect();

    let single = HashEmbedder::default();
    let all_at_once = single.embed(&texts).await.unwrap();

    let batched = HashEmbedder::default();
    let in_batches = batched.embed_batch(&texts, 3).await.unwrap();

    assert_eq!(in_batches, all_at_once);
    // 10 texts in batches of 3 need ceil(10 / 3) = 4 requests.
    assert_eq!(batched.call_count(), 4);
}

#[tokio::test]
async fn batch_size_above_input_length_makes_one_call() {
    let texts: Vec<String> = (0..4).map(|i| format!("text {i}")).collect();
    let embedder = HashEmbedder::default();

    let vectors = embedder
        .embed_batch(&texts, DEFAULT_EMBED_BATCH_SIZE)
        .await
        .unwrap();

    assert_eq!(vectors.len(), 4);
    assert_eq!(embedder.call_count(), 1);
}

#[tokio::test]
async fn ingest_stores_one_point_per_chunk_with_payload() {
    let embedder = Arc::new(HashEmbedder::default());
    let store = Arc::new(InMemoryStore::new("docs"));
    let pipeline = IngestPipeline::new(
        TextChunker::new(1000, 0).unwrap(),
        embedder.clone(),
        store.clone(),
    );

    // A short page chunks to itself; the empty page contributes nothing.
    let pages = vec!["Hello world.".to_owned(), String::new()];
    let chunks = pipeline.chunk_pages(&pages, "test.pdf");
    assert_eq!(chunks.chunks, vec!["Hello world.".to_owned()]);

    let receipt = pipeline.embed_and_upsert(&chunks).await.unwrap();

    assert_eq!(receipt.ingested, 1);
    assert_eq!(embedder.call_count(), 1);
    assert_eq!(store.len().await, 1);

    let outcome = store
        .search(&hash_vector("Hello world."), 1)
        .await
        .unwrap();
    assert_eq!(outcome.contexts, vec!["Hello world.".to_owned()]);
    assert_eq!(outcome.sources, vec!["test.pdf".to_owned()]);
}

#[tokio::test]
async fn reingesting_the_same_source_overwrites_points() {
    let embedder = Arc::new(HashEmbedder::default());
    let store = Arc::new(InMemoryStore::new("docs"));
    let pipeline = IngestPipeline::new(
        TextChunker::new(1000, 0).unwrap(),
        embedder.clone(),
        store.clone(),
    );
    let chunks = chunk_set("doc.pdf", &["first chunk", "second chunk"]);

    pipeline.embed_and_upsert(&chunks).await.unwrap();
    let receipt = pipeline.embed_and_upsert(&chunks).await.unwrap();

    // Deterministic ids make the second ingest overwrite, not append.
    assert_eq!(receipt.ingested, 2);
    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn ingesting_no_chunks_touches_nothing() {
    let embedder = Arc::new(HashEmbedder::default());
    let store = Arc::new(InMemoryStore::new("docs"));
    let pipeline = IngestPipeline::new(
        TextChunker::new(1000, 0).unwrap(),
        embedder.clone(),
        store.clone(),
    );
    let chunks = chunk_set("doc.pdf", &[]);

    let receipt = pipeline.embed_and_upsert(&chunks).await.unwrap();

    assert_eq!(receipt.ingested, 0);
    assert_eq!(embedder.call_count(), 0);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn chunks_from_one_source_get_distinct_stable_ids() {
    let embedder = Arc::new(HashEmbedder::default());
    let store = Arc::new(InMemoryStore::new("docs"));
    let pipeline = IngestPipeline::new(
        TextChunker::new(1000, 0).unwrap(),
        embedder,
        store.clone(),
    );
    let chunks = chunk_set("doc.pdf", &["first chunk", "second chunk"]);

    pipeline.embed_and_upsert(&chunks).await.unwrap();

    // The stored ids are exactly the derived ones, so a re-ingest of the
    // same source lands on the same points.
    let outcome = store.search(&hash_vector("first chunk"), 2).await.unwrap();
    assert_eq!(outcome.contexts.len(), 2);
    assert_ne!(point_id("doc.pdf", 0), point_id("doc.pdf", 1));
}

#[tokio::test]
async fn query_answers_from_retrieved_context() {
    let embedder = Arc::new(HashEmbedder::default());
    let store = Arc::new(InMemoryStore::new("docs"));
    let chat = Arc::new(RecordingChat::new("  Paris\n"));

    let fact = "Paris is the capital of France.";
    store
        .upsert(&[Point {
            id: point_id("geo.pdf", 0),
            vector: hash_vector(fact),
            payload: PointPayload {
                source: "geo.pdf".to_owned(),
                text: fact.to_owned(),
            },
        }])
        .await
        .unwrap();

    let pipeline = QueryPipeline::new(embedder, store, chat.clone());
    let question = "What is the capital of France?";

    let outcome = pipeline.embed_and_search(question, 1).await.unwrap();
    assert_eq!(outcome.contexts, vec![fact.to_owned()]);

    let answer = pipeline.answer(question, &outcome).await.unwrap();
    assert_eq!(answer.answer, "Paris");
    assert_eq!(answer.sources, vec!["geo.pdf".to_owned()]);
    assert_eq!(answer.num_contexts, 1);

    let prompts = chat.prompts.lock().await;
    assert_eq!(prompts.len(), 1);
    let (system, user) = &prompts[0];
    assert_eq!(system, "You answer questions using only the provided context.");
    assert!(user.contains(&format!("- {fact}")));
    assert!(user.contains("Question: What is the capital of France?"));
}

#[tokio::test]
async fn query_without_context_still_asks_the_model() {
    let embedder = Arc::new(HashEmbedder::default());
    let store = Arc::new(InMemoryStore::new("docs"));
    let chat = Arc::new(RecordingChat::new("I do not know."));
    let pipeline = QueryPipeline::new(embedder, store, chat.clone());

    let outcome = pipeline.embed_and_search("anything?", 5).await.unwrap();
    assert!(outcome.contexts.is_empty());

    let answer = pipeline.answer("anything?", &outcome).await.unwrap();

    assert_eq!(answer.answer, "I do not know.");
    assert!(answer.sources.is_empty());
    assert_eq!(answer.num_contexts, 0);
    assert_eq!(chat.prompts.lock().await.len(), 1);
}

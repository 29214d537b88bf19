//! `docrag-pipeline` turns PDFs into searchable vector points and questions
//! into context-grounded answers.
//!
//! Ingestion composes the loader, [`TextChunker`], an [`Embedder`], and a
//! [`VectorStore`]; querying composes the embedder, the store, and a
//! [`ChatModel`]. Backends are trait objects so tests and local runs can
//! swap the OpenAI and Qdrant implementations for in-process fakes.

pub mod chat;
pub mod chunking;
pub mod embedding;
pub mod ingest;
pub mod inmemory;
pub mod loader;
pub mod openai;
pub mod qdrant;
pub mod query;
pub mod vectorstore;

pub use chat::ChatModel;
pub use chunking::TextChunker;
pub use embedding::{DEFAULT_EMBED_BATCH_SIZE, Embedder};
pub use ingest::{IngestPipeline, point_id};
pub use inmemory::InMemoryStore;
pub use openai::{OpenAIChatModel, OpenAIEmbedder};
pub use qdrant::QdrantStore;
pub use query::QueryPipeline;
pub use vectorstore::{DEFAULT_TOP_K, Point, PointPayload, VectorStore};

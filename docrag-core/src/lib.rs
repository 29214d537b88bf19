//! Shared foundation for the `docrag` workspace: the error taxonomy every
//! component reports through, the retry policy applied at I/O boundaries,
//! and the serializable types that flow between pipeline steps.

pub mod error;
pub mod retry;
pub mod types;

pub use error::{ErrorBody, RagError, Result};
pub use retry::RetryPolicy;
pub use types::{ChunkSet, CollectionStats, QueryAnswer, SearchOutcome, UpsertReceipt};

//! Error types for the `docrag` pipeline.
//!
//! Every failure carries a machine-readable kind, a human-readable message,
//! and enough structure to serialize into an API response without leaking
//! internal error chains. Transient-vs-fatal classification is fixed per
//! variant so retry loops never have to inspect messages.

use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Map, Value, json};
use thiserror::Error;

/// Errors that can occur while ingesting documents or answering queries.
#[derive(Debug, Error)]
pub enum RagError {
    /// Invalid or missing configuration. Fatal at startup, never retried.
    #[error("Configuration error: {message}")]
    Configuration {
        /// A description of the invalid setting.
        message: String,
    },

    /// A PDF could not be read or contained no extractable text.
    #[error("PDF load error ({}): {message}", .path.display())]
    PdfLoad {
        /// Path of the document that failed to load.
        path: PathBuf,
        /// A description of the failure.
        message: String,
    },

    /// Text splitting failed or was invoked with malformed parameters.
    #[error("Chunking error: {message}")]
    Chunking {
        /// A description of the failure.
        message: String,
    },

    /// The embedding backend rejected or failed a request.
    #[error("Embedding error ({model}, {text_count} texts): {message}")]
    Embedding {
        /// The embedding model in use.
        model: String,
        /// How many texts were in the failed request.
        text_count: usize,
        /// A description of the failure.
        message: String,
        /// Whether the failure is worth retrying.
        transient: bool,
    },

    /// A vector store operation failed.
    #[error("Vector store error ({operation} on '{collection}'): {message}")]
    VectorDb {
        /// The store operation that failed (`connect`, `create_collection`,
        /// `upsert`, ...).
        operation: &'static str,
        /// The collection the operation targeted.
        collection: String,
        /// A description of the failure.
        message: String,
        /// Whether the failure is worth retrying.
        transient: bool,
    },

    /// A similarity search failed. Kept distinct from write-path failures.
    #[error("Search error: {message}")]
    Search {
        /// A description of the failure.
        message: String,
        /// Whether the failure is worth retrying.
        transient: bool,
    },

    /// The chat model rejected or failed a completion request.
    #[error("LLM error ({model}): {message}")]
    Llm {
        /// The chat model in use.
        model: String,
        /// A description of the failure.
        message: String,
        /// Whether the failure is worth retrying.
        transient: bool,
    },

    /// A retried operation kept failing until the attempt budget ran out.
    /// Distinguishable from a single fatal failure; wraps the last error.
    #[error("Retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Total attempts made before giving up.
        attempts: u32,
        /// The final transient error observed.
        last: Box<RagError>,
    },
}

/// A convenience result type for pipeline operations.
pub type Result<T> = std::result::Result<T, RagError>;

impl RagError {
    /// Stable machine-readable identifier for the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            RagError::Configuration { .. } => "configuration_error",
            RagError::PdfLoad { .. } => "pdf_load_error",
            RagError::Chunking { .. } => "chunking_error",
            RagError::Embedding { .. } => "embedding_error",
            RagError::VectorDb { .. } => "vector_db_error",
            RagError::Search { .. } => "search_error",
            RagError::Llm { .. } => "llm_error",
            RagError::RetriesExhausted { .. } => "retries_exhausted",
        }
    }

    /// Whether another attempt could plausibly succeed. Exhaustion itself is
    /// not transient: the budget is already spent.
    pub fn is_transient(&self) -> bool {
        match self {
            RagError::Embedding { transient, .. }
            | RagError::VectorDb { transient, .. }
            | RagError::Search { transient, .. }
            | RagError::Llm { transient, .. } => *transient,
            _ => false,
        }
    }

    /// Serializable representation for API responses: kind, message, and a
    /// detail map. Internal chains never cross the wire.
    pub fn wire(&self) -> ErrorBody {
        ErrorBody {
            kind: self.kind(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Map<String, Value> {
        let mut details = Map::new();
        match self {
            RagError::Configuration { .. } | RagError::Chunking { .. } => {}
            RagError::PdfLoad { path, .. } => {
                details.insert("file_path".into(), json!(path.display().to_string()));
            }
            RagError::Embedding {
                model, text_count, ..
            } => {
                details.insert("model".into(), json!(model));
                details.insert("text_count".into(), json!(text_count));
            }
            RagError::VectorDb {
                operation,
                collection,
                ..
            } => {
                details.insert("operation".into(), json!(operation));
                details.insert("collection".into(), json!(collection));
            }
            RagError::Search { .. } => {}
            RagError::Llm { model, .. } => {
                details.insert("model".into(), json!(model));
            }
            RagError::RetriesExhausted { attempts, last } => {
                details = last.details();
                details.insert("attempts".into(), json!(attempts));
                details.insert("cause".into(), json!(last.kind()));
            }
        }
        details
    }
}

/// Wire-safe error payload returned by the HTTP surface.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error kind.
    pub kind: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Structured context for the failure.
    pub details: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        let err = RagError::PdfLoad {
            path: PathBuf::from("a.pdf"),
            message: "unreadable".into(),
        };
        assert_eq!(err.kind(), "pdf_load_error");
        assert_eq!(
            RagError::Configuration {
                message: "x".into()
            }
            .kind(),
            "configuration_error"
        );
    }

    #[test]
    fn transient_flag_drives_classification() {
        let transient = RagError::Embedding {
            model: "m".into(),
            text_count: 4,
            message: "rate limited".into(),
            transient: true,
        };
        let fatal = RagError::Embedding {
            model: "m".into(),
            text_count: 4,
            message: "bad request".into(),
            transient: false,
        };
        assert!(transient.is_transient());
        assert!(!fatal.is_transient());
        assert!(
            !RagError::Configuration {
                message: "x".into()
            }
            .is_transient()
        );
    }

    #[test]
    fn exhaustion_is_distinguishable_and_not_transient() {
        let last = RagError::VectorDb {
            operation: "upsert",
            collection: "docs".into(),
            message: "timeout".into(),
            transient: true,
        };
        let err = RagError::RetriesExhausted {
            attempts: 3,
            last: Box::new(last),
        };
        assert!(matches!(err, RagError::RetriesExhausted { attempts: 3, .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn wire_body_carries_structured_details() {
        let err = RagError::VectorDb {
            operation: "upsert",
            collection: "docs".into(),
            message: "connection refused".into(),
            transient: true,
        };
        let body = err.wire();
        assert_eq!(body.kind, "vector_db_error");
        assert_eq!(body.details["operation"], json!("upsert"));
        assert_eq!(body.details["collection"], json!("docs"));
        assert!(body.message.contains("connection refused"));
    }

    #[test]
    fn exhaustion_wire_body_merges_cause_details() {
        let last = RagError::Embedding {
            model: "text-embedding-3-large".into(),
            text_count: 12,
            message: "server error".into(),
            transient: true,
        };
        let body = RagError::RetriesExhausted {
            attempts: 3,
            last: Box::new(last),
        }
        .wire();
        assert_eq!(body.kind, "retries_exhausted");
        assert_eq!(body.details["attempts"], json!(3));
        assert_eq!(body.details["cause"], json!("embedding_error"));
        assert_eq!(body.details["model"], json!("text-embedding-3-large"));
    }

    #[test]
    fn wire_body_serializes_to_flat_json() {
        let err = RagError::PdfLoad {
            path: PathBuf::from("docs/geo.pdf"),
            message: "no extractable text".into(),
        };
        let value = serde_json::to_value(err.wire()).unwrap();
        assert_eq!(value["kind"], "pdf_load_error");
        assert_eq!(value["details"]["file_path"], "docs/geo.pdf");
    }
}

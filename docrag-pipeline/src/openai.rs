//! OpenAI backends for embeddings and chat completions.
//!
//! Both providers call the REST API directly through `reqwest` with bearer
//! auth. Rate limits, server errors, and transport timeouts are classified
//! transient; the embedder retries them through its [`RetryPolicy`], while
//! chat completions surface the classification to the caller and are
//! retried at the workflow-step level.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use docrag_core::{RagError, Result, RetryPolicy};

use crate::chat::ChatModel;
use crate::embedding::Embedder;

/// The default OpenAI API base URL.
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Request timeout applied to every API call.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connect timeout applied to every API call.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Token budget for generated answers.
const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Sampling temperature for generated answers.
const DEFAULT_TEMPERATURE: f32 = 0.2;

fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| RagError::Configuration {
            message: format!("failed to build HTTP client: {e}"),
        })
}

fn require_api_key(api_key: String) -> Result<String> {
    if api_key.trim().is_empty() {
        return Err(RagError::Configuration {
            message: "OpenAI API key must not be empty".into(),
        });
    }
    Ok(api_key)
}

/// Whether a transport-level failure is worth retrying.
fn transport_is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

// ── OpenAI API request/response types ──────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatRequestMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatRequestMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Pull the API's own error message out of a failure body, falling back to
/// the raw body.
fn error_detail(body: String) -> String {
    serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}

// ── Embedder ───────────────────────────────────────────────────────

/// An [`Embedder`] backed by the OpenAI embeddings API.
///
/// # Example
///
/// ```rust,ignore
/// use docrag_pipeline::OpenAIEmbedder;
///
/// let embedder = OpenAIEmbedder::new("sk-...", "text-embedding-3-large", 3072)?;
/// let vectors = embedder.embed(&chunks).await?;
/// ```
#[derive(Debug)]
pub struct OpenAIEmbedder {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
    retry: RetryPolicy,
}

impl OpenAIEmbedder {
    /// Create a new embedder for the given model and dimensionality.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            api_key: require_api_key(api_key.into())?,
            base_url: OPENAI_BASE_URL.into(),
            model: model.into(),
            dimensions,
            retry: RetryPolicy::embedding(),
        })
    }

    /// Override the API base URL (self-hosted gateways, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn request_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(model = %self.model, error = %e, "embedding request failed");
                RagError::Embedding {
                    model: self.model.clone(),
                    text_count: texts.len(),
                    message: format!("request failed: {e}"),
                    transient: transport_is_transient(&e),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = error_detail(response.text().await.unwrap_or_default());
            error!(model = %self.model, %status, "embedding API error");
            return Err(RagError::Embedding {
                model: self.model.clone(),
                text_count: texts.len(),
                message: format!("API returned {status}: {detail}"),
                transient: status.as_u16() == 429 || status.is_server_error(),
            });
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| RagError::Embedding {
            model: self.model.clone(),
            text_count: texts.len(),
            message: format!("failed to parse response: {e}"),
            transient: false,
        })?;

        if parsed.data.len() != texts.len() {
            return Err(RagError::Embedding {
                model: self.model.clone(),
                text_count: texts.len(),
                message: format!(
                    "API returned {} vectors for {} inputs",
                    parsed.data.len(),
                    texts.len()
                ),
                transient: false,
            });
        }

        // The API is allowed to reorder entries; `index` restores input order.
        let mut data = parsed.data;
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(model = %self.model, count = texts.len(), "embedding texts");
        self.retry
            .run("embed", || self.request_embeddings(texts))
            .await
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ── ChatModel ──────────────────────────────────────────────────────

/// A [`ChatModel`] backed by the OpenAI chat completions API.
///
/// Answers are generated with a fixed token budget (1024) and low
/// temperature (0.2). The call is made once; step-level retry of the whole
/// answer step handles transient failures.
#[derive(Debug)]
pub struct OpenAIChatModel {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAIChatModel {
    /// Create a new chat backend for the given model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            api_key: require_api_key(api_key.into())?,
            base_url: OPENAI_BASE_URL.into(),
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        })
    }

    /// Override the API base URL (self-hosted gateways, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        debug!(model = %self.model, user_len = user.len(), "requesting completion");

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatRequestMessage {
                    role: "system",
                    content: system,
                },
                ChatRequestMessage {
                    role: "user",
                    content: user,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(model = %self.model, error = %e, "completion request failed");
                RagError::Llm {
                    model: self.model.clone(),
                    message: format!("request failed: {e}"),
                    transient: transport_is_transient(&e),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = error_detail(response.text().await.unwrap_or_default());
            error!(model = %self.model, %status, "completion API error");
            return Err(RagError::Llm {
                model: self.model.clone(),
                message: format!("API returned {status}: {detail}"),
                transient: status.as_u16() == 429 || status.is_server_error(),
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| RagError::Llm {
            model: self.model.clone(),
            message: format!("failed to parse response: {e}"),
            transient: false,
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| RagError::Llm {
                model: self.model.clone(),
                message: "API returned no choices".into(),
                transient: false,
            })
    }

    fn model(&self) -> &str {
        &self.model
    }
}

//! Chat model trait for answer generation.

use async_trait::async_trait;

use docrag_core::Result;

/// A chat backend that produces one completion for a system + user message
/// pair. Token budget and temperature are fixed at construction; the
/// pipeline treats answer generation as a single non-streaming call.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a completion for the given system instruction and user
    /// message.
    async fn complete(&self, system: &str, user: &str) -> Result<String>;

    /// Name of the chat model, for diagnostics.
    fn model(&self) -> &str;
}

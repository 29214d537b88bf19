//! Memoized step execution.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use docrag_core::{RagError, Result};

use crate::ledger::StepLedger;

/// Per-invocation handle that pipeline steps run through.
///
/// [`run`](StepContext::run) consults the ledger before executing: a step
/// that already recorded an output for this invocation is replayed from the
/// record instead of executed again. The caller never assumes a step runs at
/// most once; the ledger makes repeats harmless.
pub struct StepContext {
    invocation_id: String,
    ledger: Arc<dyn StepLedger>,
}

impl StepContext {
    pub fn new(invocation_id: impl Into<String>, ledger: Arc<dyn StepLedger>) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            ledger,
        }
    }

    pub fn invocation_id(&self) -> &str {
        &self.invocation_id
    }

    /// Run `step` at most once per invocation.
    ///
    /// The output is recorded only on success, so a failed step reruns on
    /// the next attempt of the invocation.
    pub async fn run<T, F, Fut>(&self, step: &'static str, execute: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(recorded) = self.ledger.get(&self.invocation_id, step).await? {
            debug!(invocation = %self.invocation_id, step, "replaying recorded step output");
            return serde_json::from_value(recorded).map_err(|e| RagError::Configuration {
                message: format!("recorded output of step '{step}' is unreadable: {e}"),
            });
        }

        let output = execute().await?;

        let value = serde_json::to_value(&output).map_err(|e| RagError::Configuration {
            message: format!("step '{step}' produced an unserializable output: {e}"),
        })?;
        self.ledger.put(&self.invocation_id, step, value).await?;
        info!(invocation = %self.invocation_id, step, "step completed");
        Ok(output)
    }
}

//! Persisted step-output records.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use docrag_core::Result;

/// Durable record of completed step outputs, keyed by
/// `(invocation_id, step_name)`.
///
/// Only successful outputs are recorded; a failed step leaves no trace and
/// runs again when its invocation is retried.
#[async_trait]
pub trait StepLedger: Send + Sync {
    /// Fetch the recorded output for a step, if it already completed.
    async fn get(&self, invocation_id: &str, step: &str) -> Result<Option<Value>>;

    /// Record a step's successful output.
    async fn put(&self, invocation_id: &str, step: &str, output: Value) -> Result<()>;
}

/// Process-local ledger for single-node deployments and tests.
#[derive(Default)]
pub struct InMemoryLedger {
    records: RwLock<HashMap<(String, String), Value>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StepLedger for InMemoryLedger {
    async fn get(&self, invocation_id: &str, step: &str) -> Result<Option<Value>> {
        let records = self.records.read().await;
        Ok(records
            .get(&(invocation_id.to_owned(), step.to_owned()))
            .cloned())
    }

    async fn put(&self, invocation_id: &str, step: &str, output: Value) -> Result<()> {
        let mut records = self.records.write().await;
        records.insert((invocation_id.to_owned(), step.to_owned()), output);
        Ok(())
    }
}

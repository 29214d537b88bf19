//! Durable-step execution contract for pipeline invocations.
//!
//! Pipeline steps are pure async functions from a typed input to a typed,
//! serializable output. This crate owns the two pieces of machinery around
//! them: a [`StepLedger`] that records each step's successful output keyed
//! by `(invocation_id, step_name)` so re-entered invocations replay instead
//! of re-executing, and an [`AdmissionGate`] that bounds how often ingestion
//! invocations may start.

pub mod admission;
pub mod context;
pub mod ledger;

pub use admission::{Admission, AdmissionGate};
pub use context::StepContext;
pub use ledger::{InMemoryLedger, StepLedger};

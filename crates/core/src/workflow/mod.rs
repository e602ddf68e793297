//! Entry lifecycle workflow.
//!
//! This module implements the entry lifecycle state machine, the per-kind
//! auto-post policy, and reversal generation.
//!
//! # Modules
//!
//! - `types` - Workflow domain types (EntryStatus, Action, WorkflowAction)
//! - `error` - Workflow-specific error types
//! - `policy` - Per-kind approve/post chaining and reversal dating rules
//! - `service` - State transition logic
//! - `reversal` - Reversing entry creation

pub mod error;
pub mod policy;
pub mod reversal;
pub mod service;
pub mod types;

#[cfg(test)]
mod reversal_props;
#[cfg(test)]
mod service_props;

pub use error::WorkflowError;
pub use policy::{UnknownEntryKind, WorkflowPolicy};
pub use reversal::{ReversalRequest, ReversalService};
pub use service::WorkflowService;
pub use types::{Action, EntryStatus, WorkflowAction};

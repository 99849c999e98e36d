//! Error types for the workflow engine.

use alloy_core::error::AlloyError;
use alloy_core::types::OrderId;

use crate::phase::WorkflowPhase;

/// Errors from workflow operations and the dispatch runtime.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Invalid workflow transition: {0} -> {1}")]
    InvalidTransition(WorkflowPhase, WorkflowPhase),
    #[error("Operation requires phase {expected}, current phase is {actual}")]
    NotInPhase {
        expected: WorkflowPhase,
        actual: WorkflowPhase,
    },
    #[error("Procedure script must contain at least one step")]
    EmptyProcedure,
    #[error("Service order not found: {0}")]
    UnknownOrder(OrderId),
    #[error("Workflow runtime is no longer running")]
    RuntimeClosed,
    #[error(transparent)]
    Core(#[from] AlloyError),
}

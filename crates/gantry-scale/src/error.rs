//! Scaler error types.

use thiserror::Error;

/// Errors surfaced to the trigger's caller.
///
/// Safety violations (disabled policy, missing group, bound breach) are
/// not errors; they stop the batch and fold into the trigger outcome.
#[derive(Debug, Error)]
pub enum ScaleError {
    #[error("orchestrator error: {0}")]
    Orchestrator(#[from] gantry_orchestrator::OrchestratorError),

    #[error("state store error: {0}")]
    State(#[from] gantry_state::StateError),
}

pub type ScaleResult<T> = Result<T, ScaleError>;

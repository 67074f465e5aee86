//! Orchestrator client error types.

use thiserror::Error;

/// Errors raised by orchestrator API calls.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {status} from {path}")]
    UnexpectedStatus { path: String, status: u16 },

    #[error("response decode error: {0}")]
    Decode(String),

    #[error("allocation stats unavailable for {0}")]
    StatsUnavailable(String),
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

//! Metrics collection error types.

use thiserror::Error;

/// Errors raised while gathering utilization or external metric values.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("orchestrator error: {0}")]
    Orchestrator(#[from] gantry_orchestrator::OrchestratorError),

    #[error("no provider configured for {0}")]
    UnknownProvider(String),

    #[error("metric query failed: {0}")]
    Query(String),

    #[error("metric response is not a single scalar: {0}")]
    Parse(String),
}

pub type MetricsResult<T> = Result<T, MetricsError>;

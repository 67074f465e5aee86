//! State store error types.

use thiserror::Error;

/// Errors raised by the state store and policy backends.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to open state store: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialize error: {0}")]
    Serialize(String),

    #[error("deserialize error: {0}")]
    Deserialize(String),

    #[error("invalid policy: {0}")]
    InvalidPolicy(#[from] gantry_policy::PolicyError),
}

pub type StateResult<T> = Result<T, StateError>;

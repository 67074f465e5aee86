//! Policy error types.

use thiserror::Error;

/// Errors raised while decoding or validating a scaling policy.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("empty policy: at least one field must be set")]
    Empty,

    #[error("external check {0}: query must not be empty")]
    EmptyQuery(String),

    #[error("policy decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type PolicyResult<T> = Result<T, PolicyError>;

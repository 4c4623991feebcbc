//! Caller-facing errors for the trust oracle.
//!
//! Provider faults never reach this level; the orchestrator resolves them to
//! values. What remains is bad input and bad configuration.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type OracleResult<T> = Result<T, OracleError>;

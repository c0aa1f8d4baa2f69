use std::io;

use thiserror::Error;

/// Represents the outer-level, user-facing errors of the balancer-ops package.
///
/// Variants:
/// - `InvalidInput`: The workflow was given bad parameters (amounts, addresses, pool
///   descriptions).
/// - `FatalError`: There is a problem with the application setup (keys, config, runtime).
/// - `RecoverableError`: A chain read failed. Retrying at a later time may succeed, but nothing in
///   this package retries on its own.
/// - `TransactionFailed`: A transaction could not be submitted or was mined with a failed status.
#[derive(Error, Debug, PartialEq)]
pub enum ExecutionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Fatal error: {0}")]
    FatalError(String),
    #[error("Recoverable error: {0}")]
    RecoverableError(String),
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),
}

impl From<io::Error> for ExecutionError {
    fn from(err: io::Error) -> Self {
        ExecutionError::FatalError(err.to_string())
    }
}

impl From<serde_json::Error> for ExecutionError {
    fn from(err: serde_json::Error) -> Self {
        ExecutionError::FatalError(err.to_string())
    }
}

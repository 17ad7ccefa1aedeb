//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::{BatchError, InvariantViolation};

/// Application errors wrap domain errors and add application-level context.
///
/// Single rejected steps are not errors; they are reported per step by the
/// replay service.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("atomic replay rejected at line {line}: {source}")]
    AtomicRejected {
        line: usize,
        #[source]
        source: BatchError<String>,
    },

    #[error("tree invariant broken after line {line}: {violation}")]
    Invariant {
        line: usize,
        #[source]
        violation: InvariantViolation,
    },

    #[error("script line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

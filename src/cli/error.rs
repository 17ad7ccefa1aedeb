//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::exitcode;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),

    #[error("{count} mutation(s) rejected")]
    Rejected { count: usize },

    /// Some scripts of a `check` run were not clean.
    ///
    /// `cause` is the first script that could not be loaded or parsed, if
    /// any; it decides the exit code.
    #[error("{count} of {total} script(s) failed")]
    ScriptsFailed {
        count: usize,
        total: usize,
        #[source]
        cause: Option<ApplicationError>,
    },
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => exitcode::USAGE,
            CliError::Rejected { .. } => exitcode::REJECTED,
            CliError::ScriptsFailed { cause, .. } => {
                cause.as_ref().map_or(exitcode::REJECTED, application_exit_code)
            }
            CliError::Infra(InfraError::Io { .. }) => exitcode::IOERR,
            CliError::Infra(InfraError::Application(app)) => application_exit_code(app),
        }
    }
}

fn application_exit_code(e: &ApplicationError) -> i32 {
    match e {
        ApplicationError::AtomicRejected { .. } => exitcode::REJECTED,
        ApplicationError::Parse { .. } => exitcode::DATAERR,
        ApplicationError::Config { .. } => exitcode::CONFIG,
        ApplicationError::OperationFailed { .. } => exitcode::NOINPUT,
        ApplicationError::Invariant { .. } => exitcode::SOFTWARE,
    }
}

//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::exitcode;
use crate::infrastructure::traits::FetchError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("{0}")]
    Usage(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

impl From<DomainError> for CliError {
    fn from(e: DomainError) -> Self {
        ApplicationError::from(e).into()
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => exitcode::IOERR,
                InfraError::Application(app) => match app {
                    ApplicationError::Domain(DomainError::InvalidComplexity { .. }) => {
                        exitcode::USAGE
                    }
                    ApplicationError::Domain(DomainError::EmptyHierarchy) => exitcode::SOFTWARE,
                    ApplicationError::Domain(DomainError::MalformedTree { .. }) => {
                        exitcode::DATAERR
                    }
                    ApplicationError::Fetch(FetchError::Network { .. })
                    | ApplicationError::Fetch(FetchError::Status { .. }) => exitcode::UNAVAILABLE,
                    ApplicationError::Fetch(FetchError::Read { .. }) => exitcode::NOINPUT,
                    ApplicationError::Fetch(FetchError::Endpoint(_))
                    | ApplicationError::Config { .. } => exitcode::CONFIG,
                    ApplicationError::OperationFailed { .. } => exitcode::IOERR,
                },
            },
        }
    }
}

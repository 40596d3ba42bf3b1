//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::DomainError;
use crate::infrastructure::traits::FetchError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("{0}")]
    Fetch(#[from] FetchError),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApplicationError {
    /// The fetched document could not be decoded.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            ApplicationError::Domain(DomainError::MalformedTree { .. })
                | ApplicationError::Domain(DomainError::EmptyHierarchy)
        )
    }

    /// The BOM source could not be reached or answered with an error status.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            ApplicationError::Fetch(FetchError::Network { .. })
                | ApplicationError::Fetch(FetchError::Status { .. })
        )
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

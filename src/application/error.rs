//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::DomainError;
use crate::infrastructure::traits::ApiError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("no engine selected")]
    NoEngineSelected,

    #[error("invalid JSON: {message}")]
    InvalidJson { message: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("{context}: {source}")]
    Backend {
        context: String,
        #[source]
        source: ApiError,
    },
}

impl ApplicationError {
    pub fn backend(context: impl Into<String>, source: ApiError) -> Self {
        Self::Backend {
            context: context.into(),
            source,
        }
    }

    pub fn invalid_json(err: &serde_json::Error) -> Self {
        Self::InvalidJson {
            message: err.to_string(),
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

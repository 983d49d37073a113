//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::infrastructure::traits::ApiError;
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

    /// Already shown to the user as a notification.
    #[error("{message}")]
    Reported { message: String, code: i32 },
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

impl From<DomainError> for CliError {
    fn from(e: DomainError) -> Self {
        ApplicationError::Domain(e).into()
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::Reported { code, .. } => *code,
            CliError::Infra(e) => match e {
                InfraError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound => {
                    crate::exitcode::NOINPUT
                }
                InfraError::Io { .. } => crate::exitcode::IOERR,
                InfraError::Backend { .. } => crate::exitcode::CONFIG,
                InfraError::Application(app) => match app {
                    ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                    ApplicationError::NoEngineSelected => crate::exitcode::USAGE,
                    ApplicationError::Domain(_) | ApplicationError::InvalidJson { .. } => {
                        crate::exitcode::DATAERR
                    }
                    ApplicationError::Backend {
                        source: ApiError::Transport(_),
                        ..
                    } => crate::exitcode::UNAVAILABLE,
                    ApplicationError::Backend { .. } => crate::exitcode::FAILURE,
                },
            },
        }
    }

    /// Whether the message still needs printing.
    pub fn is_reported(&self) -> bool {
        matches!(self, CliError::Reported { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exitcode;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::Usage("x".into()).exit_code(), exitcode::USAGE);
        assert_eq!(
            CliError::from(ApplicationError::NoEngineSelected).exit_code(),
            exitcode::USAGE
        );
        assert_eq!(
            CliError::from(DomainError::RootNotGroup).exit_code(),
            exitcode::DATAERR
        );
        assert_eq!(
            CliError::from(ApplicationError::backend(
                "list engines",
                ApiError::Transport("refused".into())
            ))
            .exit_code(),
            exitcode::UNAVAILABLE
        );
        assert_eq!(
            CliError::Reported {
                message: "Error adding rule: refused".into(),
                code: exitcode::UNAVAILABLE,
            }
            .exit_code(),
            exitcode::UNAVAILABLE
        );
    }
}

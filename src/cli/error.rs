//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
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

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        use crate::exitcode;

        match self {
            CliError::Usage(_) => exitcode::USAGE,
            CliError::Infra(InfraError::Io { .. }) => exitcode::IOERR,
            CliError::Infra(InfraError::Application(e)) => match e {
                ApplicationError::Config { .. } => exitcode::CONFIG,
                ApplicationError::OperationFailed { .. } => exitcode::IOERR,
                ApplicationError::Domain(d) => match d {
                    DomainError::UnknownOperation(_) => exitcode::USAGE,
                    DomainError::SourceMissing(_) | DomainError::SourceNotFound(_) => {
                        exitcode::NOINPUT
                    }
                    DomainError::DestinationAlreadyExists(_)
                    | DomainError::AlreadyInstalled(_)
                    | DomainError::DestinationConflict { .. }
                    | DomainError::NameCollision { .. } => exitcode::CANTCREAT,
                    DomainError::TargetMismatch { .. }
                    | DomainError::NotASymlink(_)
                    | DomainError::UnexpectedLayout(_)
                    | DomainError::InvalidCommandName(_) => exitcode::DATAERR,
                },
            },
        }
    }
}

//! Domain-level errors (no external dependencies)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::Operation;

/// Domain errors represent lifecycle precondition violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("source directory not found: {0}")]
    SourceMissing(PathBuf),

    #[error("destination already exists, run clean first: {0}")]
    DestinationAlreadyExists(PathBuf),

    #[error("already installed, run uninstall first: {0}")]
    AlreadyInstalled(PathBuf),

    #[error("installed commands not found, run copy first: {0}")]
    SourceNotFound(PathBuf),

    #[error("command name collision: '{name}' derived from {first} and {second}")]
    NameCollision {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("link destination already exists: {link} (would point to {target})")]
    DestinationConflict { link: PathBuf, target: PathBuf },

    #[error("refusing to remove {link}: points to {actual}, expected {expected}")]
    TargetMismatch {
        link: PathBuf,
        actual: PathBuf,
        expected: PathBuf,
    },

    #[error("refusing to remove {0}: not a symlink")]
    NotASymlink(PathBuf),

    #[error("unexpected installed layout, missing: {0}")]
    UnexpectedLayout(PathBuf),

    #[error("cannot derive command name from: {0}")]
    InvalidCommandName(PathBuf),

    #[error("unknown operation '{0}', expected one of: {ops}", ops = Operation::names().join(", "))]
    UnknownOperation(String),
}

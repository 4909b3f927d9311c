// ABOUTME: Top-level error type for the radi binary and library callers.
// ABOUTME: Wraps config, build and property errors behind one Result alias.

use crate::config::ConfigError;
use crate::handler::BuildError;
use crate::operation::PropertyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error("invalid property assignment '{0}', expected ID=VALUE")]
    InvalidAssignment(String),

    #[error(transparent)]
    Property(#[from] PropertyError),

    #[error("operation {operation} failed: {message}")]
    OperationFailed { operation: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

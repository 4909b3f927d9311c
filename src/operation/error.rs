// ABOUTME: Error type returned by operation validation and execution.
// ABOUTME: Wraps config, runtime, compose and REST failures behind one enum.

use super::PropertyError;
use crate::compose::ComposeError;
use crate::config::ConfigError;
use crate::rest::ApiError;
use crate::runtime::{ContainerError, ImageError, LogError, RuntimeError};

#[derive(Debug, thiserror::Error)]
pub enum OperationError {
    #[error("missing required properties: {}", .0.join(", "))]
    MissingProperties(Vec<String>),

    #[error(transparent)]
    Property(#[from] PropertyError),

    #[error("operation {operation} is not authorized for user {user}")]
    Unauthorized { operation: String, user: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Logs(#[from] LogError),

    #[error(transparent)]
    Compose(#[from] ComposeError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("command {command} exited with code {code}")]
    CommandFailed { command: String, code: i64 },

    #[error("{0}")]
    Failed(String),
}

impl OperationError {
    pub fn failed(message: impl Into<String>) -> Self {
        OperationError::Failed(message.into())
    }
}

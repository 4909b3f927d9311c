// ABOUTME: Scoped configuration: connectors over byte sources plus typed YAML wrappers.
// ABOUTME: Settings, commands, authorization rules and the project file all live here.

mod authorize;
mod command;
mod connector;
pub(crate) mod deserialize;
mod env_value;
mod project;
mod scoped;
mod settings;
mod wrapper;

pub use authorize::{AUTHORIZE_KEY, AuthorizeWrapper};
pub use command::{
    COMMANDS_KEY, Command, CommandKind, CommandLine, CommandsWrapper, ContainerCommand,
    HostCommand, PullPolicy, VolumeSpec,
};
pub use connector::{ConfigConnector, DirectoryConnector, MemoryConnector};
pub use env_value::{EnvValue, resolve_env_map};
pub use project::{
    BuilderEntry, PROJECT_FILENAME, ProjectConfig, RADI_DIR, init_project, template_yaml,
};
pub use scoped::ScopedValues;
pub use settings::{SETTINGS_KEY, SettingsWrapper};
pub use wrapper::ConfigWrapper;

use crate::bytesource::ByteSourceError;
use std::path::PathBuf;
use thiserror::Error;

/// Scope that local writes go to unless told otherwise.
pub const DEFAULT_SCOPE: &str = "project";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown scope '{scope}' for config key '{key}'")]
    UnknownScope { key: String, scope: String },

    #[error("invalid config key: {0}")]
    InvalidKey(String),

    #[error(transparent)]
    Source(#[from] ByteSourceError),

    #[error("invalid YAML in {location}: {error}")]
    Yaml {
        location: String,
        error: serde_yaml::Error,
    },

    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("no radi project found in {} or any parent directory", .0.display())]
    ProjectNotFound(PathBuf),

    #[error("file already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub(crate) fn yaml(location: impl Into<String>, error: serde_yaml::Error) -> Self {
        ConfigError::Yaml {
            location: location.into(),
            error,
        }
    }
}

// ABOUTME: Handler and Builder traits plus the implementation names builders activate.
// ABOUTME: Builders turn project settings into handlers; handlers produce operations.

mod registry;

pub use registry::{BuilderFactory, BuilderRegistry, ProjectBuild, ProjectBuilder};

use crate::config::ConfigError;
use crate::diagnostics::{Diagnostics, Warning};
use crate::operation::Operations;
use crate::security::Authorizer;
use crate::types::ProjectName;
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// Functional area a builder can provide operations for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Implementation {
    Config,
    Setting,
    Security,
    Monitor,
    Orchestrate,
    Command,
    Provision,
    Project,
}

impl Implementation {
    pub const ALL: &'static [Implementation] = &[
        Implementation::Config,
        Implementation::Setting,
        Implementation::Security,
        Implementation::Monitor,
        Implementation::Orchestrate,
        Implementation::Command,
        Implementation::Provision,
        Implementation::Project,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Implementation::Config => "config",
            Implementation::Setting => "setting",
            Implementation::Security => "security",
            Implementation::Monitor => "monitor",
            Implementation::Orchestrate => "orchestrate",
            Implementation::Command => "command",
            Implementation::Provision => "provision",
            Implementation::Project => "project",
        }
    }

    /// Operation ids every provider of this implementation is expected to offer.
    pub fn standard_operations(&self) -> &'static [&'static str] {
        match self {
            Implementation::Config => &["config.list", "config.get", "config.set"],
            Implementation::Setting => &["setting.list", "setting.get", "setting.set"],
            Implementation::Security => &["security.user", "security.authorize"],
            Implementation::Monitor => &["monitor.info", "monitor.ps", "monitor.logs"],
            Implementation::Orchestrate => &[
                "orchestrate.up",
                "orchestrate.down",
                "orchestrate.start",
                "orchestrate.stop",
                "orchestrate.restart",
                "orchestrate.pull",
                "orchestrate.build",
            ],
            Implementation::Command => &["command.list", "command.get", "command.exec"],
            Implementation::Provision => &["provision.create", "provision.remove"],
            Implementation::Project => &["project.info", "project.init"],
        }
    }
}

impl FromStr for Implementation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Implementation::ALL
            .iter()
            .copied()
            .find(|i| i.as_str() == lower)
            .ok_or_else(|| format!("unknown implementation: {s}"))
    }
}

impl fmt::Display for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Implementation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("unknown builder type: {0}")]
    UnknownBuilder(String),

    #[error("invalid settings for builder {builder}: {error}")]
    Settings {
        builder: String,
        error: serde_yaml::Error,
    },

    #[error("builder {builder}: {message}")]
    Invalid { builder: String, message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl BuildError {
    pub fn invalid(builder: &str, message: impl Into<String>) -> Self {
        BuildError::Invalid {
            builder: builder.to_string(),
            message: message.into(),
        }
    }
}

/// Where the project lives; shared by every builder.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    pub root: PathBuf,
    pub name: ProjectName,
    /// Builder types listed in the project file, in order.
    pub builders: Vec<String>,
}

/// Settings handed to a builder: project context plus its own settings mapping.
#[derive(Debug, Clone)]
pub struct BuilderSettings {
    project: ProjectContext,
    values: serde_yaml::Mapping,
}

impl BuilderSettings {
    pub fn new(project: ProjectContext, values: serde_yaml::Mapping) -> Self {
        Self { project, values }
    }

    pub fn project(&self) -> &ProjectContext {
        &self.project
    }

    pub fn values(&self) -> &serde_yaml::Mapping {
        &self.values
    }

    /// Deserialize the settings mapping into a builder's settings type.
    pub fn decode<T: DeserializeOwned>(&self, builder: &str) -> Result<T, BuildError> {
        serde_yaml::from_value(serde_yaml::Value::Mapping(self.values.clone())).map_err(|error| {
            BuildError::Settings {
                builder: builder.to_string(),
                error,
            }
        })
    }
}

/// A named bundle of operations for one functional area.
pub trait Handler: Send + Sync {
    fn id(&self) -> &'static str;

    /// Fresh operation instances; callers own and mutate them.
    fn operations(&self) -> Operations;
}

/// Activates implementations and wires up the handlers behind them.
pub trait Builder: Send + Sync {
    fn id(&self) -> &'static str;

    fn supports(&self) -> &'static [Implementation];

    /// Activate `implementations`. Unsupported ones are reported to `diag` and skipped.
    fn activate(
        &mut self,
        implementations: &[Implementation],
        settings: &BuilderSettings,
        diag: &mut Diagnostics,
    ) -> Result<(), BuildError>;

    fn operations(&self) -> Operations;

    /// Rules gate for every operation, when this builder activated security.
    fn authorizer(&self) -> Option<Arc<dyn Authorizer>> {
        None
    }
}

/// The subset of `requested` that `builder` supports, in request order.
pub fn supported_implementations(
    builder: &dyn Builder,
    requested: &[Implementation],
    diag: &mut Diagnostics,
) -> Vec<Implementation> {
    let mut accepted = Vec::new();
    for implementation in requested {
        if !builder.supports().contains(implementation) {
            diag.warn(Warning::unsupported_implementation(format!(
                "builder {} does not provide {}",
                builder.id(),
                implementation
            )));
        } else if !accepted.contains(implementation) {
            accepted.push(*implementation);
        }
    }
    accepted
}

/// Handlers activated by one builder.
#[derive(Default)]
pub struct HandlerSet(Vec<Box<dyn Handler>>);

impl HandlerSet {
    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn push(&mut self, handler: impl Handler + 'static) {
        tracing::debug!(handler = handler.id(), "handler activated");
        self.0.push(Box::new(handler));
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.0.iter().map(|h| h.id()).collect()
    }

    pub fn operations(&self) -> Operations {
        let mut operations = Operations::new();
        for handler in &self.0 {
            operations.merge(handler.operations());
        }
        operations
    }
}

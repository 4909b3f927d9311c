// ABOUTME: The rancher builder: stacks in a Rancher 1.x environment driven over the v2-beta API.
// ABOUTME: The project's compose files become the stack definition.

mod client;
mod operations;
mod types;

pub use client::RancherClient;
pub use operations::{RancherHandler, RancherOperation, props};
pub use types::{Collection, Environment, NewStack, Service, Stack, StackAction};

use crate::compose::DEFAULT_COMPOSE_FILE;
use crate::config::EnvValue;
use crate::diagnostics::{Diagnostics, Warning};
use crate::handler::{
    BuildError, Builder, BuilderSettings, HandlerSet, Implementation, ProjectContext,
    supported_implementations,
};
use crate::operation::{OperationError, Operations};
use crate::rest::{Credentials, DEFAULT_TIMEOUT};
use serde::Deserialize;
use serde_yaml::Value;
use std::path::PathBuf;
use std::time::Duration;

pub const BUILDER_ID: &str = "rancher";

const SUPPORTED: &[Implementation] = &[
    Implementation::Orchestrate,
    Implementation::Monitor,
    Implementation::Provision,
];

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RancherSettings {
    /// Server root, e.g. `https://rancher.example.com`.
    pub url: String,
    #[serde(default)]
    pub access_key: Option<EnvValue>,
    #[serde(default)]
    pub secret_key: Option<EnvValue>,
    /// Environment id or name.
    pub environment: String,
    /// Stack name; defaults to the project name.
    #[serde(default)]
    pub stack: Option<String>,
    #[serde(default)]
    pub files: Vec<PathBuf>,
    #[serde(default)]
    pub rancher_compose: Option<PathBuf>,
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

/// Settings resolved against the project, shared by every rancher operation.
#[derive(Debug, Clone)]
pub struct RancherContext {
    pub url: String,
    pub access_key: Option<EnvValue>,
    pub secret_key: Option<EnvValue>,
    pub environment: String,
    pub stack: String,
    pub files: Vec<PathBuf>,
    pub rancher_compose: Option<PathBuf>,
    pub timeout: Duration,
}

impl RancherContext {
    pub fn new(settings: RancherSettings, project: &ProjectContext) -> Self {
        let resolve = |path: PathBuf| {
            if path.is_absolute() {
                path
            } else {
                project.root.join(path)
            }
        };

        let files = if settings.files.is_empty() {
            vec![PathBuf::from(DEFAULT_COMPOSE_FILE)]
        } else {
            settings.files
        };

        Self {
            url: settings.url,
            access_key: settings.access_key,
            secret_key: settings.secret_key,
            environment: settings.environment,
            stack: settings
                .stack
                .unwrap_or_else(|| project.name.to_string()),
            files: files.into_iter().map(resolve).collect(),
            rancher_compose: settings.rancher_compose.map(resolve),
            timeout: settings.timeout.unwrap_or(DEFAULT_TIMEOUT),
        }
    }

    /// API keys are resolved at call time so a missing variable only fails the operation.
    pub fn client(&self) -> Result<RancherClient, OperationError> {
        let credentials = match (&self.access_key, &self.secret_key) {
            (Some(access), Some(secret)) => Some(Credentials {
                username: access.resolve()?,
                password: secret.resolve()?,
            }),
            (None, None) => None,
            _ => {
                return Err(OperationError::failed(
                    "rancher access_key and secret_key must be set together",
                ));
            }
        };
        Ok(RancherClient::new(&self.url, credentials, self.timeout)?)
    }

    /// Stack definition from the compose files; later files override earlier ones.
    pub fn new_stack(&self, name: &str, start_on_create: bool) -> Result<NewStack, OperationError> {
        let mut merged = Value::Null;
        for file in &self.files {
            let text = read(file)?;
            let value: Value = serde_yaml::from_str(&text).map_err(|e| {
                OperationError::failed(format!("invalid compose file {}: {e}", file.display()))
            })?;
            merge_yaml(&mut merged, value);
        }
        let docker_compose = serde_yaml::to_string(&merged)
            .map_err(|e| OperationError::failed(format!("cannot render compose file: {e}")))?;

        let rancher_compose = match self.rancher_compose {
            Some(ref file) => Some(read(file)?),
            None => None,
        };

        Ok(NewStack {
            name: name.to_string(),
            docker_compose,
            rancher_compose,
            start_on_create,
        })
    }

    pub fn missing_files(&self) -> Vec<PathBuf> {
        self.files
            .iter()
            .chain(self.rancher_compose.iter())
            .filter(|f| !f.exists())
            .cloned()
            .collect()
    }
}

fn read(path: &std::path::Path) -> Result<String, OperationError> {
    std::fs::read_to_string(path)
        .map_err(|e| OperationError::failed(format!("cannot read {}: {e}", path.display())))
}

/// Mappings merge key by key; anything else is replaced.
pub fn merge_yaml(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_yaml(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[derive(Default)]
pub struct RancherBuilder {
    handlers: HandlerSet,
}

impl RancherBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Builder for RancherBuilder {
    fn id(&self) -> &'static str {
        BUILDER_ID
    }

    fn supports(&self) -> &'static [Implementation] {
        SUPPORTED
    }

    fn activate(
        &mut self,
        implementations: &[Implementation],
        settings: &BuilderSettings,
        diag: &mut Diagnostics,
    ) -> Result<(), BuildError> {
        let accepted = supported_implementations(&*self, implementations, diag);
        let rancher: RancherSettings = settings.decode(BUILDER_ID)?;
        if rancher.environment.trim().is_empty() {
            return Err(BuildError::invalid(BUILDER_ID, "environment must not be empty"));
        }
        let context = RancherContext::new(rancher, settings.project());

        if accepted.contains(&Implementation::Orchestrate) || accepted.contains(&Implementation::Provision) {
            for file in context.missing_files() {
                diag.warn(Warning::missing_source(format!(
                    "rancher stack file {} not found",
                    file.display()
                )));
            }
        }

        self.handlers.clear();
        for implementation in accepted {
            self.handlers
                .push(RancherHandler::new(implementation, context.clone()));
        }
        Ok(())
    }

    fn operations(&self) -> Operations {
        self.handlers.operations()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProjectName;
    use std::path::Path;

    fn project() -> ProjectContext {
        ProjectContext {
            root: PathBuf::from("/srv/shop"),
            name: ProjectName::new("shop").unwrap(),
            builders: vec![BUILDER_ID.to_string()],
        }
    }

    #[test]
    fn defaults_come_from_the_project() {
        let settings: RancherSettings =
            serde_yaml::from_str("url: https://rancher.test\nenvironment: Default").unwrap();
        let context = RancherContext::new(settings, &project());
        assert_eq!(context.stack, "shop");
        assert_eq!(context.files, [Path::new("/srv/shop/docker-compose.yml")]);
        assert_eq!(context.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn timeout_is_humantime() {
        let settings: RancherSettings = serde_yaml::from_str(
            "url: https://rancher.test\nenvironment: Default\ntimeout: 90s",
        )
        .unwrap();
        assert_eq!(settings.timeout, Some(Duration::from_secs(90)));
    }

    #[test]
    fn half_configured_keys_are_rejected() {
        let settings: RancherSettings = serde_yaml::from_str(
            "url: https://rancher.test\nenvironment: Default\naccess_key: abc",
        )
        .unwrap();
        let context = RancherContext::new(settings, &project());
        assert!(context.client().is_err());
    }

    #[test]
    fn overlay_mappings_merge() {
        let mut base: Value =
            serde_yaml::from_str("services:\n  web:\n    image: nginx\n    ports: ['80']").unwrap();
        let overlay: Value =
            serde_yaml::from_str("services:\n  web:\n    ports: ['8080']\n  db:\n    image: pg").unwrap();
        merge_yaml(&mut base, overlay);

        assert_eq!(base["services"]["web"]["image"], Value::from("nginx"));
        assert_eq!(base["services"]["web"]["ports"][0], Value::from("8080"));
        assert_eq!(base["services"]["db"]["image"], Value::from("pg"));
    }
}

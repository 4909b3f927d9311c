// ABOUTME: The compose builder: orchestrate and monitor operations over `docker compose`.
// ABOUTME: Container listing and engine info go to the engine through bollard.

mod monitor;
mod orchestrate;

pub use monitor::{MonitorHandler, MonitorOperation};
pub use orchestrate::{OrchestrateHandler, OrchestrateOperation};

use crate::compose::{CliComposeRunner, ComposeProject, ComposeRunner, DEFAULT_BINARY};
use crate::diagnostics::{Diagnostics, Warning};
use crate::handler::{
    BuildError, Builder, BuilderSettings, HandlerSet, Implementation, ProjectContext,
    supported_implementations,
};
use crate::operation::Operations;
use crate::runtime::RuntimeConfig;
use crate::types::ProjectName;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

pub const BUILDER_ID: &str = "compose";

const SUPPORTED: &[Implementation] = &[Implementation::Orchestrate, Implementation::Monitor];

/// Settings of a compose builder; the local builder accepts the same keys.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComposeSettings {
    /// Compose project name; defaults to the radi project name.
    #[serde(default)]
    pub project: Option<ProjectName>,
    #[serde(default)]
    pub files: Vec<PathBuf>,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    #[serde(default)]
    pub env_files: Vec<PathBuf>,
    #[serde(default)]
    pub profiles: Vec<String>,
    #[serde(default)]
    pub binary: Option<String>,
    #[serde(flatten)]
    pub runtime: RuntimeConfig,
}

impl ComposeSettings {
    /// The compose project these settings describe within `project`.
    pub fn compose_project(&self, project: &ProjectContext) -> ComposeProject {
        let working_dir = match self.working_dir {
            Some(ref dir) if dir.is_absolute() => dir.clone(),
            Some(ref dir) => project.root.join(dir),
            None => project.root.clone(),
        };
        let name = self.project.clone().unwrap_or_else(|| project.name.clone());

        let mut compose = ComposeProject::new(name, working_dir);
        if !self.files.is_empty() {
            compose.files = self.files.iter().map(|f| compose.resolve(f)).collect();
        }
        compose.env_files = self.env_files.iter().map(|f| compose.resolve(f)).collect();
        compose.profiles = self.profiles.clone();
        compose
    }

    pub fn context(&self, project: &ProjectContext) -> ComposeContext {
        let binary = self.binary.as_deref().unwrap_or(DEFAULT_BINARY);
        ComposeContext::new(
            self.compose_project(project),
            Arc::new(CliComposeRunner::new(binary)),
            self.runtime.clone(),
        )
    }
}

/// Everything a compose operation needs, shared by all of them.
#[derive(Clone)]
pub struct ComposeContext {
    pub project: ComposeProject,
    pub runner: Arc<dyn ComposeRunner>,
    pub runtime: RuntimeConfig,
}

impl ComposeContext {
    pub fn new(project: ComposeProject, runner: Arc<dyn ComposeRunner>, runtime: RuntimeConfig) -> Self {
        Self {
            project,
            runner,
            runtime,
        }
    }

    /// Warn about compose files that do not exist yet.
    pub fn check_files(&self, diag: &mut Diagnostics) {
        for file in self.project.missing_files() {
            diag.warn(Warning::missing_source(format!(
                "compose file {} not found",
                file.display()
            )));
        }
    }
}

/// Register the handlers for `implementations` backed by `context`.
pub(crate) fn push_handlers(
    handlers: &mut HandlerSet,
    implementations: &[Implementation],
    context: &ComposeContext,
) {
    for implementation in implementations {
        match implementation {
            Implementation::Orchestrate => {
                handlers.push(OrchestrateHandler::new(context.clone()))
            }
            Implementation::Monitor => handlers.push(MonitorHandler::new(context.clone())),
            _ => {}
        }
    }
}

#[derive(Default)]
pub struct ComposeBuilder {
    handlers: HandlerSet,
}

impl ComposeBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Builder for ComposeBuilder {
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
        let compose: ComposeSettings = settings.decode(BUILDER_ID)?;
        let context = compose.context(settings.project());
        if !accepted.is_empty() {
            context.check_files(diag);
        }

        self.handlers.clear();
        push_handlers(&mut self.handlers, &accepted, &context);
        Ok(())
    }

    fn operations(&self) -> Operations {
        self.handlers.operations()
    }
}

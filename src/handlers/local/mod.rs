// ABOUTME: The local builder: config and settings from YAML directories, commands, project
// ABOUTME: management and authorization, with orchestrate/monitor handed to the compose handler.

mod command;
mod config;
mod project;
mod run;
mod security;
mod setting;

pub use command::{CommandExecOperation, CommandGetOperation, CommandHandler, CommandListOperation};
pub use config::{ConfigGetOperation, ConfigHandler, ConfigListOperation, ConfigSetOperation};
pub use project::{ProjectHandler, ProjectInfoOperation, ProjectInitOperation};
pub use run::{COMMAND_LABEL, CommandContext, Invocation, PROJECT_LABEL};
pub use security::{SecurityAuthorizeOperation, SecurityHandler, SecurityUserOperation};
pub use setting::{SettingGetOperation, SettingHandler, SettingListOperation, SettingSetOperation};

/// Property ids of the local operations.
pub mod props {
    pub use super::command::{
        ARGS as COMMAND_ARGS, DEFINITION as COMMAND_DEFINITION, DESCRIPTION as COMMAND_DESCRIPTION,
        ENV as COMMAND_ENV, EXIT_CODE as COMMAND_EXIT_CODE, HELP as COMMAND_HELP, ID as COMMAND_ID,
        IDS as COMMAND_IDS, INCLUDE_INTERNAL as COMMAND_INCLUDE_INTERNAL,
    };
    pub use super::config::{KEY as CONFIG_KEY, KEYS as CONFIG_KEYS, VALUE as CONFIG_VALUE};
    pub use super::project::{
        BUILDERS as PROJECT_BUILDERS, FILE as PROJECT_FILE, FORCE as PROJECT_FORCE,
        NAME as PROJECT_NAME, ROOT as PROJECT_ROOT,
    };
    pub use super::security::{
        ALLOWED as SECURITY_ALLOWED, DECISION as SECURITY_DECISION,
        OPERATION as SECURITY_OPERATION, USER_HOST as SECURITY_USER_HOST,
        USER_ID as SECURITY_USER_ID,
    };
    pub use super::setting::{
        KEY as SETTING_KEY, KEYS as SETTING_KEYS, SCOPE as SETTING_SCOPE,
        SCOPES as SETTING_SCOPES, VALUE as SETTING_VALUE,
    };
}

use super::compose::{self as compose_handler, ComposeSettings};
use crate::config::{
    AuthorizeWrapper, ConfigWrapper, DirectoryConnector, RADI_DIR, deserialize::deserialize_optional_dir,
};
use crate::diagnostics::Diagnostics;
use crate::handler::{
    BuildError, Builder, BuilderSettings, HandlerSet, Implementation, ProjectContext,
    supported_implementations,
};
use crate::operation::Operations;
use crate::security::{Authorizer, CurrentUser, RuleAuthorizer};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

pub const BUILDER_ID: &str = "local";

pub const USER_SCOPE: &str = "user";
pub const PROJECT_SCOPE: &str = "project";

const SUPPORTED: &[Implementation] = &[
    Implementation::Config,
    Implementation::Setting,
    Implementation::Command,
    Implementation::Project,
    Implementation::Security,
    Implementation::Orchestrate,
    Implementation::Monitor,
];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalSettings {
    /// Project scope directory, relative to the project root.
    #[serde(default)]
    pub config_dir: Option<PathBuf>,

    #[serde(default, deserialize_with = "deserialize_optional_dir")]
    pub user_config_dir: Option<Option<PathBuf>>,

    #[serde(flatten)]
    pub compose: ComposeSettings,
}

impl LocalSettings {
    pub fn project_dir(&self, project: &ProjectContext) -> PathBuf {
        match self.config_dir {
            Some(ref dir) if dir.is_absolute() => dir.clone(),
            Some(ref dir) => project.root.join(dir),
            None => project.root.join(RADI_DIR),
        }
    }

    /// The user scope directory, `None` when disabled or unknown on this platform.
    pub fn user_dir(&self) -> Option<PathBuf> {
        match self.user_config_dir {
            Some(ref configured) => configured.clone(),
            None => dirs::config_dir().map(|dir| dir.join("radi")),
        }
    }

    /// Scopes in precedence order: user, then project.
    pub fn connector(&self, project: &ProjectContext) -> DirectoryConnector {
        let mut connector = DirectoryConnector::new();
        if let Some(dir) = self.user_dir() {
            connector = connector.with_scope(USER_SCOPE, dir);
        }
        connector.with_scope(PROJECT_SCOPE, self.project_dir(project))
    }
}

#[derive(Default)]
pub struct LocalBuilder {
    handlers: HandlerSet,
    authorizer: Option<Arc<dyn Authorizer>>,
}

impl LocalBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Builder for LocalBuilder {
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
        let local: LocalSettings = settings.decode(BUILDER_ID)?;
        let project = settings.project();

        let config = ConfigWrapper::new(Arc::new(local.connector(project)));
        tracing::debug!(scopes = ?config.scopes(), "local config scopes");

        self.handlers.clear();
        self.authorizer = None;

        let mut compose_implementations = Vec::new();
        for implementation in accepted {
            match implementation {
                Implementation::Config => self.handlers.push(ConfigHandler::new(config.clone())),
                Implementation::Setting => self.handlers.push(SettingHandler::new(config.clone())),
                Implementation::Command => {
                    let context = CommandContext {
                        root: project.root.clone(),
                        project: project.name.clone(),
                        runtime: local.compose.runtime.clone(),
                    };
                    self.handlers.push(CommandHandler::new(config.clone(), context));
                }
                Implementation::Project => self.handlers.push(ProjectHandler::new(project.clone())),
                Implementation::Security => {
                    let rules = AuthorizeWrapper::new(config.clone()).load()?;
                    tracing::debug!(rules = rules.len(), "authorization rules loaded");
                    let authorizer: Arc<dyn Authorizer> =
                        Arc::new(RuleAuthorizer::new(rules, CurrentUser::detect()));
                    self.handlers.push(SecurityHandler::new(Arc::clone(&authorizer)));
                    self.authorizer = Some(authorizer);
                }
                Implementation::Orchestrate | Implementation::Monitor => {
                    compose_implementations.push(implementation)
                }
                Implementation::Provision => {}
            }
        }

        if !compose_implementations.is_empty() {
            let context = local.compose.context(project);
            context.check_files(diag);
            compose_handler::push_handlers(&mut self.handlers, &compose_implementations, &context);
        }

        Ok(())
    }

    fn operations(&self) -> Operations {
        self.handlers.operations()
    }

    fn authorizer(&self) -> Option<Arc<dyn Authorizer>> {
        self.authorizer.clone()
    }
}

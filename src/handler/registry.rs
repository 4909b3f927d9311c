// ABOUTME: Builder registry and the project builder that composes every configured builder.
// ABOUTME: Later builders override earlier ones per operation id; security wraps the result.

use super::{BuildError, Builder, BuilderSettings, Implementation, ProjectContext};
use crate::config::ProjectConfig;
use crate::diagnostics::{Diagnostics, Warning};
use crate::handlers::{compose, local, null, rancher, upcloud};
use crate::operation::Operations;
use crate::security::{AuthorizedOperation, Authorizer};
use indexmap::IndexMap;
use std::sync::Arc;

pub type BuilderFactory = fn() -> Box<dyn Builder>;

/// Builder type name to factory.
pub struct BuilderRegistry {
    factories: IndexMap<&'static str, BuilderFactory>,
}

impl BuilderRegistry {
    /// A registry with nothing registered.
    pub fn empty() -> Self {
        Self {
            factories: IndexMap::new(),
        }
    }

    pub fn register(&mut self, name: &'static str, factory: BuilderFactory) {
        self.factories.insert(name, factory);
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn Builder>, BuildError> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| BuildError::UnknownBuilder(name.to_string()))
    }
}

impl Default for BuilderRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(local::BUILDER_ID, || Box::new(local::LocalBuilder::new()));
        registry.register(compose::BUILDER_ID, || Box::new(compose::ComposeBuilder::new()));
        registry.register(rancher::BUILDER_ID, || Box::new(rancher::RancherBuilder::new()));
        registry.register(upcloud::BUILDER_ID, || Box::new(upcloud::UpcloudBuilder::new()));
        registry.register(null::BUILDER_ID, || Box::new(null::NullBuilder::new()));
        registry
    }
}

/// Result of building a project: its operations and the builders behind them.
pub struct ProjectBuild {
    pub operations: Operations,
    pub builders: Vec<&'static str>,
    pub secured: bool,
}

/// Activates every builder a project lists.
pub struct ProjectBuilder<'a> {
    registry: &'a BuilderRegistry,
}

impl<'a> ProjectBuilder<'a> {
    pub fn new(registry: &'a BuilderRegistry) -> Self {
        Self { registry }
    }

    pub fn build(
        &self,
        project: &ProjectConfig,
        diag: &mut Diagnostics,
    ) -> Result<ProjectBuild, BuildError> {
        let context = ProjectContext {
            root: project.root.clone(),
            name: project.project_name(),
            builders: project.builders.iter().map(|b| b.kind.clone()).collect(),
        };

        let mut operations = Operations::new();
        let mut builders = Vec::new();
        let mut authorizer: Option<Arc<dyn Authorizer>> = None;

        for entry in project.builders.iter() {
            let mut builder = self.registry.create(&entry.kind)?;

            if entry.implementations.is_empty() {
                diag.warn(Warning::no_implementations(format!(
                    "builder {} lists no implementations",
                    entry.kind
                )));
            }

            let settings = BuilderSettings::new(context.clone(), entry.settings.clone());
            builder.activate(&entry.implementations, &settings, diag)?;
            tracing::debug!(
                builder = builder.id(),
                implementations = ?entry.implementations,
                "builder activated"
            );

            operations.merge(builder.operations());

            // The last builder that activates security decides the rules,
            // and one that activates it without rules switches gating off.
            if entry.implementations.contains(&Implementation::Security) {
                authorizer = builder.authorizer();
            }
            builders.push(builder.id());
        }

        let secured = authorizer.is_some();
        if let Some(authorizer) = authorizer {
            operations = operations.map(|op| {
                if is_security_operation(op.id()) {
                    op
                } else {
                    Box::new(AuthorizedOperation::new(op, Arc::clone(&authorizer)))
                }
            });
        }

        Ok(ProjectBuild {
            operations,
            builders,
            secured,
        })
    }
}

fn is_security_operation(id: &str) -> bool {
    crate::types::OperationId::new(id)
        .map(|id| id.implementation() == Implementation::Security.as_str())
        .unwrap_or(false)
}

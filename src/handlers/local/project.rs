// ABOUTME: project.* operations: describe the current project or write a fresh project file.

use crate::config::init_project;
use crate::handler::{Handler, ProjectContext};
use crate::operation::{
    Operation, OperationError, OperationMeta, Operations, Properties, Property, PropertyKind,
    PropertyValue, Usage, operation_meta,
};
use async_trait::async_trait;

pub const NAME: &str = "project.name";
pub const ROOT: &str = "project.root";
pub const BUILDERS: &str = "project.builders";
pub const FORCE: &str = "project.force";
pub const FILE: &str = "project.file";

pub struct ProjectInfoOperation {
    meta: OperationMeta,
    properties: Properties,
    project: ProjectContext,
}

impl ProjectInfoOperation {
    pub fn new(project: ProjectContext) -> Self {
        Self {
            meta: OperationMeta::new("project.info", "Project info", "Show the current project."),
            properties: Properties::new()
                .with(Property::new(NAME, PropertyKind::String).label("Name").usage(Usage::output()))
                .with(Property::new(ROOT, PropertyKind::String).label("Root").usage(Usage::output()))
                .with(
                    Property::new(BUILDERS, PropertyKind::StringList)
                        .label("Builders")
                        .usage(Usage::output()),
                ),
            project,
        }
    }
}

#[async_trait]
impl Operation for ProjectInfoOperation {
    operation_meta!();

    async fn exec(&mut self) -> Result<(), OperationError> {
        let project = &self.project;
        self.properties
            .set(NAME, PropertyValue::String(project.name.to_string()))?;
        self.properties
            .set(ROOT, PropertyValue::String(project.root.display().to_string()))?;
        self.properties
            .set(BUILDERS, PropertyValue::StringList(project.builders.clone()))?;
        Ok(())
    }
}

pub struct ProjectInitOperation {
    meta: OperationMeta,
    properties: Properties,
    project: ProjectContext,
}

impl ProjectInitOperation {
    pub fn new(project: ProjectContext) -> Self {
        Self {
            meta: OperationMeta::new(
                "project.init",
                "Initialize project",
                "Write a starter .radi/project.yml in the project root.",
            )
            .with_help("An existing project file is only replaced when project.force is set."),
            properties: Properties::new()
                .with(
                    Property::new(NAME, PropertyKind::String)
                        .label("Name")
                        .description("Defaults to the root directory name."),
                )
                .with(
                    Property::new(FORCE, PropertyKind::Bool)
                        .label("Overwrite")
                        .default_value(PropertyValue::Bool(false)),
                )
                .with(Property::new(FILE, PropertyKind::String).label("File").usage(Usage::output())),
            project,
        }
    }
}

#[async_trait]
impl Operation for ProjectInitOperation {
    operation_meta!();

    async fn exec(&mut self) -> Result<(), OperationError> {
        let force = self.properties.bool(FORCE).unwrap_or(false);
        let name = self.properties.string(NAME).filter(|n| !n.is_empty());
        let path = init_project(&self.project.root, name, force)?;
        self.properties
            .set(FILE, PropertyValue::String(path.display().to_string()))?;
        Ok(())
    }
}

pub struct ProjectHandler {
    project: ProjectContext,
}

impl ProjectHandler {
    pub fn new(project: ProjectContext) -> Self {
        Self { project }
    }
}

impl Handler for ProjectHandler {
    fn id(&self) -> &'static str {
        "local.project"
    }

    fn operations(&self) -> Operations {
        Operations::new()
            .with(ProjectInfoOperation::new(self.project.clone()))
            .with(ProjectInitOperation::new(self.project.clone()))
    }
}

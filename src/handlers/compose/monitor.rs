// ABOUTME: monitor.* operations for a compose project.
// ABOUTME: ps and info ask the engine directly; logs and config go through compose.

use super::ComposeContext;
use crate::compose::{ComposeAction, OutputMode, PROJECT_LABEL};
use crate::handler::Handler;
use crate::operation::{
    Operation, OperationError, OperationMeta, Operations, Properties, Property, PropertyKind,
    PropertyValue, Usage, operation_meta,
};
use crate::runtime::{self, ContainerFilters, ContainerOps, RuntimeInfo};
use async_trait::async_trait;

pub const CONTAINERS: &str = "monitor.containers";
pub const FOLLOW: &str = "monitor.follow";
pub const TAIL: &str = "monitor.tail";
pub const SERVICES: &str = "monitor.services";
pub const INFO: &str = "monitor.info";
pub const CONFIG: &str = "monitor.config";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Ps,
    Logs,
    Info,
    Config,
}

const KINDS: &[Kind] = &[Kind::Info, Kind::Ps, Kind::Logs, Kind::Config];

impl Kind {
    fn meta(self) -> OperationMeta {
        match self {
            Kind::Ps => OperationMeta::new(
                "monitor.ps",
                "Containers",
                "List the project's containers and their state.",
            ),
            Kind::Logs => OperationMeta::new(
                "monitor.logs",
                "Logs",
                "Show output from the project's containers.",
            ),
            Kind::Info => OperationMeta::new(
                "monitor.info",
                "Engine info",
                "Show the container engine's name, version and platform.",
            ),
            Kind::Config => OperationMeta::new(
                "monitor.config",
                "Compose config",
                "Show the resolved compose configuration.",
            )
            .with_help("Runs `docker compose config` with the project's files, env files and profiles."),
        }
    }

    fn properties(self) -> Properties {
        match self {
            Kind::Ps => Properties::new().with(
                Property::new(CONTAINERS, PropertyKind::StringList)
                    .label("Containers")
                    .description("One `name state status` line per container.")
                    .usage(Usage::output()),
            ),
            Kind::Logs => Properties::new()
                .with(
                    Property::new(SERVICES, PropertyKind::StringList)
                        .label("Services")
                        .description("Limit output to these services."),
                )
                .with(
                    Property::new(FOLLOW, PropertyKind::Bool)
                        .label("Follow")
                        .description("Keep streaming new output.")
                        .default_value(PropertyValue::Bool(false)),
                )
                .with(
                    Property::new(TAIL, PropertyKind::Int)
                        .label("Tail")
                        .description("Number of lines to show from the end of the logs."),
                ),
            Kind::Info => Properties::new().with(
                Property::new(INFO, PropertyKind::StringMap)
                    .label("Engine")
                    .usage(Usage::output()),
            ),
            Kind::Config => Properties::new().with(
                Property::new(CONFIG, PropertyKind::String)
                    .label("Config")
                    .usage(Usage::output()),
            ),
        }
    }
}

pub struct MonitorOperation {
    meta: OperationMeta,
    properties: Properties,
    kind: Kind,
    context: ComposeContext,
}

impl MonitorOperation {
    fn new(kind: Kind, context: ComposeContext) -> Self {
        Self {
            meta: kind.meta(),
            properties: kind.properties(),
            kind,
            context,
        }
    }

    async fn ps(&mut self) -> Result<(), OperationError> {
        let engine = runtime::connect(&self.context.runtime)?;
        let filters = ContainerFilters::default()
            .label(PROJECT_LABEL, self.context.project.name.as_str())
            .all();
        let lines = engine
            .list_containers(&filters)
            .await?
            .iter()
            .map(|c| c.line())
            .collect();
        self.properties
            .set(CONTAINERS, PropertyValue::StringList(lines))?;
        Ok(())
    }

    async fn logs(&mut self) -> Result<(), OperationError> {
        let tail = match self.properties.int(TAIL) {
            Some(n) if n < 0 => {
                return Err(OperationError::failed(format!("{TAIL} must not be negative")));
            }
            Some(n) => Some(n as u64),
            None => None,
        };
        let action = ComposeAction::Logs {
            follow: self.properties.bool(FOLLOW).unwrap_or(false),
            tail,
            services: self.properties.string_list(SERVICES).to_vec(),
        };
        self.context
            .runner
            .run(&self.context.project, &action, OutputMode::Inherited)
            .await?;
        Ok(())
    }

    async fn info(&mut self) -> Result<(), OperationError> {
        let engine = runtime::connect(&self.context.runtime)?;
        let metadata = engine.info().await.map_err(runtime::RuntimeError::from)?;
        self.properties
            .set(INFO, PropertyValue::StringMap(metadata.to_map()))?;
        Ok(())
    }

    async fn config(&mut self) -> Result<(), OperationError> {
        let output = self
            .context
            .runner
            .run(&self.context.project, &ComposeAction::Config, OutputMode::Captured)
            .await?;
        self.properties
            .set(CONFIG, PropertyValue::String(output.stdout))?;
        Ok(())
    }
}

#[async_trait]
impl Operation for MonitorOperation {
    operation_meta!();

    async fn exec(&mut self) -> Result<(), OperationError> {
        match self.kind {
            Kind::Ps => self.ps().await,
            Kind::Logs => self.logs().await,
            Kind::Info => self.info().await,
            Kind::Config => self.config().await,
        }
    }
}

pub struct MonitorHandler {
    context: ComposeContext,
}

impl MonitorHandler {
    pub fn new(context: ComposeContext) -> Self {
        Self { context }
    }
}

impl Handler for MonitorHandler {
    fn id(&self) -> &'static str {
        "compose.monitor"
    }

    fn operations(&self) -> Operations {
        let mut operations = Operations::new();
        for kind in KINDS {
            operations.add(Box::new(MonitorOperation::new(*kind, self.context.clone())));
        }
        operations
    }
}

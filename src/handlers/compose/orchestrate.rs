// ABOUTME: orchestrate.* operations mapped onto compose up/down/start/stop/restart/pull/build.
// ABOUTME: One operation type; the kind decides its properties and compose action.

use super::ComposeContext;
use crate::compose::{ComposeAction, OutputMode};
use crate::handler::Handler;
use crate::operation::{
    Operation, OperationError, OperationMeta, Operations, Properties, Property, PropertyKind,
    PropertyValue, operation_meta,
};
use async_trait::async_trait;

pub const SERVICES: &str = "orchestrate.services";
pub const DETACH: &str = "orchestrate.detach";
pub const BUILD: &str = "orchestrate.build";
pub const REMOVE_ORPHANS: &str = "orchestrate.remove_orphans";
pub const VOLUMES: &str = "orchestrate.volumes";
pub const TIMEOUT: &str = "orchestrate.timeout";
pub const NO_CACHE: &str = "orchestrate.no_cache";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Up,
    Down,
    Start,
    Stop,
    Restart,
    Pull,
    Build,
}

const KINDS: &[Kind] = &[
    Kind::Up,
    Kind::Down,
    Kind::Start,
    Kind::Stop,
    Kind::Restart,
    Kind::Pull,
    Kind::Build,
];

impl Kind {
    fn meta(self) -> OperationMeta {
        match self {
            Kind::Up => OperationMeta::new(
                "orchestrate.up",
                "Up",
                "Create and start the project's containers.",
            ),
            Kind::Down => OperationMeta::new(
                "orchestrate.down",
                "Down",
                "Stop and remove the project's containers and networks.",
            ),
            Kind::Start => OperationMeta::new(
                "orchestrate.start",
                "Start",
                "Start existing containers.",
            ),
            Kind::Stop => OperationMeta::new(
                "orchestrate.stop",
                "Stop",
                "Stop running containers without removing them.",
            ),
            Kind::Restart => OperationMeta::new(
                "orchestrate.restart",
                "Restart",
                "Restart the project's containers.",
            ),
            Kind::Pull => OperationMeta::new(
                "orchestrate.pull",
                "Pull",
                "Pull the images of the project's services.",
            ),
            Kind::Build => OperationMeta::new(
                "orchestrate.build",
                "Build",
                "Build the images of the project's services.",
            ),
        }
    }

    fn properties(self) -> Properties {
        let services = Property::new(SERVICES, PropertyKind::StringList)
            .label("Services")
            .description("Limit the operation to these services.");
        let remove_orphans = flag(REMOVE_ORPHANS, "Remove orphans")
            .description("Remove containers for services no longer in the compose file.");
        let timeout = Property::new(TIMEOUT, PropertyKind::Duration)
            .label("Timeout")
            .description("Time to wait for containers to stop.");

        match self {
            Kind::Up => Properties::new()
                .with(services)
                .with(
                    flag(DETACH, "Detach")
                        .description("Run containers in the background.")
                        .default_value(PropertyValue::Bool(true)),
                )
                .with(flag(BUILD, "Build").description("Build images before starting."))
                .with(remove_orphans),
            Kind::Down => Properties::new()
                .with(flag(VOLUMES, "Volumes").description("Also remove named volumes."))
                .with(remove_orphans),
            Kind::Stop | Kind::Restart => Properties::new().with(services).with(timeout),
            Kind::Build => Properties::new()
                .with(services)
                .with(flag(NO_CACHE, "No cache").description("Do not use the build cache.")),
            Kind::Start | Kind::Pull => Properties::new().with(services),
        }
    }

    fn action(self, properties: &Properties) -> ComposeAction {
        let services = properties.string_list(SERVICES).to_vec();
        let enabled = |id: &str| properties.bool(id).unwrap_or(false);

        match self {
            Kind::Up => ComposeAction::Up {
                detach: properties.bool(DETACH).unwrap_or(true),
                build: enabled(BUILD),
                remove_orphans: enabled(REMOVE_ORPHANS),
                services,
            },
            Kind::Down => ComposeAction::Down {
                volumes: enabled(VOLUMES),
                remove_orphans: enabled(REMOVE_ORPHANS),
            },
            Kind::Start => ComposeAction::Start { services },
            Kind::Stop => ComposeAction::Stop {
                timeout: properties.duration(TIMEOUT),
                services,
            },
            Kind::Restart => ComposeAction::Restart {
                timeout: properties.duration(TIMEOUT),
                services,
            },
            Kind::Pull => ComposeAction::Pull { services },
            Kind::Build => ComposeAction::Build {
                no_cache: enabled(NO_CACHE),
                services,
            },
        }
    }
}

fn flag(id: &str, label: &str) -> Property {
    Property::new(id, PropertyKind::Bool).label(label)
}

pub struct OrchestrateOperation {
    meta: OperationMeta,
    properties: Properties,
    kind: Kind,
    context: ComposeContext,
}

impl OrchestrateOperation {
    fn new(kind: Kind, context: ComposeContext) -> Self {
        Self {
            meta: kind.meta(),
            properties: kind.properties(),
            kind,
            context,
        }
    }

    /// The compose action the current property values describe.
    pub fn action(&self) -> ComposeAction {
        self.kind.action(&self.properties)
    }
}

#[async_trait]
impl Operation for OrchestrateOperation {
    operation_meta!();

    async fn exec(&mut self) -> Result<(), OperationError> {
        let action = self.action();
        self.context
            .runner
            .run(&self.context.project, &action, OutputMode::for_action(&action))
            .await?;
        Ok(())
    }
}

pub struct OrchestrateHandler {
    context: ComposeContext,
}

impl OrchestrateHandler {
    pub fn new(context: ComposeContext) -> Self {
        Self { context }
    }
}

impl Handler for OrchestrateHandler {
    fn id(&self) -> &'static str {
        "compose.orchestrate"
    }

    fn operations(&self) -> Operations {
        let mut operations = Operations::new();
        for kind in KINDS {
            operations.add(Box::new(OrchestrateOperation::new(*kind, self.context.clone())));
        }
        operations
    }
}

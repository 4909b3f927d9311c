// ABOUTME: orchestrate, monitor and provision operations against a Rancher stack.
// ABOUTME: One operation type; the kind decides its implementation, properties and API calls.

use super::RancherContext;
use super::types::{Stack, StackAction};
use crate::handler::{Handler, Implementation};
use crate::operation::{
    Operation, OperationError, OperationMeta, Operations, Properties, Property, PropertyKind,
    PropertyValue, Usage, operation_meta,
};
use async_trait::async_trait;
use indexmap::IndexMap;

/// Property ids of the rancher operations.
pub mod props {
    pub const STACK: &str = "rancher.stack";
    pub const STACK_ID: &str = "rancher.stack.id";
    pub const STACK_STATE: &str = "rancher.stack.state";
    pub const ENVIRONMENTS: &str = "rancher.environments";
    pub const CONTAINERS: &str = "monitor.containers";
    pub const INFO: &str = "monitor.info";
}

use props::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Up,
    Stop,
    Down,
    Info,
    Ps,
    Create,
    Remove,
    Environments,
}

impl Kind {
    fn for_implementation(implementation: Implementation) -> &'static [Kind] {
        match implementation {
            Implementation::Orchestrate => &[Kind::Up, Kind::Stop, Kind::Down],
            Implementation::Monitor => &[Kind::Info, Kind::Ps],
            Implementation::Provision => &[Kind::Create, Kind::Remove, Kind::Environments],
            _ => &[],
        }
    }

    fn meta(self) -> OperationMeta {
        match self {
            Kind::Up => OperationMeta::new(
                "orchestrate.up",
                "Up",
                "Activate the stack's services, creating the stack when missing.",
            ),
            Kind::Stop => OperationMeta::new("orchestrate.stop", "Stop", "Deactivate the stack's services."),
            Kind::Down => OperationMeta::new("orchestrate.down", "Down", "Deactivate the stack's services.")
                .with_help("The stack itself is kept; use provision.remove to delete it."),
            Kind::Info => OperationMeta::new(
                "monitor.info",
                "Stack info",
                "Show the environment and the state of the stack.",
            ),
            Kind::Ps => OperationMeta::new("monitor.ps", "Services", "List the stack's services."),
            Kind::Create => OperationMeta::new(
                "provision.create",
                "Create stack",
                "Create the stack from the compose files without starting it.",
            ),
            Kind::Remove => OperationMeta::new("provision.remove", "Remove stack", "Delete the stack."),
            Kind::Environments => OperationMeta::new(
                "provision.environments",
                "Environments",
                "List the environments visible to the API keys.",
            ),
        }
    }

    fn properties(self) -> Properties {
        let stack = Property::new(STACK, PropertyKind::String)
            .label("Stack")
            .description("Overrides the configured stack name.");
        let output = |id: &str, kind: PropertyKind, label: &str| {
            Property::new(id, kind).label(label).usage(Usage::output())
        };
        let stack_outputs = |properties: Properties| {
            properties
                .with(output(STACK_ID, PropertyKind::String, "Stack id"))
                .with(output(STACK_STATE, PropertyKind::String, "Stack state"))
        };

        match self {
            Kind::Up | Kind::Stop | Kind::Down | Kind::Create => stack_outputs(Properties::new().with(stack)),
            Kind::Remove => Properties::new().with(stack),
            Kind::Info => Properties::new()
                .with(stack)
                .with(output(INFO, PropertyKind::StringMap, "Info")),
            Kind::Ps => Properties::new().with(stack).with(
                output(CONTAINERS, PropertyKind::StringList, "Services")
                    .description("One `name state scale` line per service."),
            ),
            Kind::Environments => Properties::new().with(
                output(ENVIRONMENTS, PropertyKind::StringList, "Environments")
                    .description("One `id name state` line per environment."),
            ),
        }
    }
}

pub struct RancherOperation {
    meta: OperationMeta,
    properties: Properties,
    kind: Kind,
    context: RancherContext,
}

impl RancherOperation {
    fn new(kind: Kind, context: RancherContext) -> Self {
        Self {
            meta: kind.meta(),
            properties: kind.properties(),
            kind,
            context,
        }
    }

    fn stack_name(&self) -> String {
        self.properties
            .string(STACK)
            .filter(|s| !s.is_empty())
            .unwrap_or(self.context.stack.as_str())
            .to_string()
    }

    fn set_stack(&mut self, stack: &Stack) -> Result<(), OperationError> {
        self.properties
            .set(STACK_ID, PropertyValue::String(stack.id.to_string()))?;
        self.properties
            .set(STACK_STATE, PropertyValue::String(stack.state.clone()))?;
        Ok(())
    }
}

fn missing(name: &str) -> OperationError {
    OperationError::failed(format!("stack {name} not found"))
}

#[async_trait]
impl Operation for RancherOperation {
    operation_meta!();

    async fn exec(&mut self) -> Result<(), OperationError> {
        let client = self.context.client()?;

        if self.kind == Kind::Environments {
            let lines = client.environments().await?.iter().map(|e| e.line()).collect();
            self.properties.set(ENVIRONMENTS, PropertyValue::StringList(lines))?;
            return Ok(());
        }

        let environment = client.environment(&self.context.environment).await?;
        let name = self.stack_name();
        let existing = client.find_stack(&environment.id, &name).await?;
        tracing::debug!(stack = %name, environment = %environment.name, exists = existing.is_some(), "stack lookup");

        match self.kind {
            Kind::Up => {
                let stack = match existing {
                    Some(stack) => {
                        client
                            .stack_action(&environment.id, &stack.id, StackAction::Activate)
                            .await?
                    }
                    None => {
                        let new = self.context.new_stack(&name, true)?;
                        client.create_stack(&environment.id, &new).await?
                    }
                };
                self.set_stack(&stack)?;
            }
            Kind::Stop | Kind::Down => {
                let stack = existing.ok_or_else(|| missing(&name))?;
                let stack = client
                    .stack_action(&environment.id, &stack.id, StackAction::Deactivate)
                    .await?;
                self.set_stack(&stack)?;
            }
            Kind::Create => {
                if existing.is_some() {
                    return Err(OperationError::failed(format!("stack {name} already exists")));
                }
                let new = self.context.new_stack(&name, false)?;
                let stack = client.create_stack(&environment.id, &new).await?;
                self.set_stack(&stack)?;
            }
            Kind::Remove => match existing {
                Some(stack) => client.delete_stack(&environment.id, &stack.id).await?,
                None => tracing::info!(stack = %name, "stack already absent"),
            },
            Kind::Info => {
                let mut info = IndexMap::new();
                info.insert("environment".to_string(), environment.name.clone());
                info.insert("environment_id".to_string(), environment.id.to_string());
                info.insert("stack".to_string(), name.clone());
                match existing {
                    Some(stack) => {
                        info.insert("stack_id".to_string(), stack.id.to_string());
                        info.insert("state".to_string(), stack.state.clone());
                        if let Some(health) = stack.health_state {
                            info.insert("health".to_string(), health);
                        }
                        if let Some(created) = stack.created {
                            info.insert("created".to_string(), created.to_rfc3339());
                        }
                    }
                    None => {
                        info.insert("state".to_string(), "absent".to_string());
                    }
                }
                self.properties.set(INFO, PropertyValue::StringMap(info))?;
            }
            Kind::Ps => {
                let stack = existing.ok_or_else(|| missing(&name))?;
                let lines = client
                    .stack_services(&environment.id, &stack.id)
                    .await?
                    .iter()
                    .map(|s| s.line())
                    .collect();
                self.properties.set(CONTAINERS, PropertyValue::StringList(lines))?;
            }
            Kind::Environments => {}
        }
        Ok(())
    }
}

/// Rancher operations for one implementation.
pub struct RancherHandler {
    implementation: Implementation,
    context: RancherContext,
}

impl RancherHandler {
    pub fn new(implementation: Implementation, context: RancherContext) -> Self {
        Self {
            implementation,
            context,
        }
    }
}

impl Handler for RancherHandler {
    fn id(&self) -> &'static str {
        match self.implementation {
            Implementation::Orchestrate => "rancher.orchestrate",
            Implementation::Monitor => "rancher.monitor",
            _ => "rancher.provision",
        }
    }

    fn operations(&self) -> Operations {
        let mut operations = Operations::new();
        for kind in Kind::for_implementation(self.implementation) {
            operations.add(Box::new(RancherOperation::new(*kind, self.context.clone())));
        }
        operations
    }
}

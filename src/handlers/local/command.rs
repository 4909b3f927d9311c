// ABOUTME: command.* operations: list, describe and execute commands from commands.yml.
// ABOUTME: Internal commands are hidden from listings unless asked for.

use super::run::{self, CommandContext, Invocation};
use crate::config::{CommandsWrapper, ConfigWrapper};
use crate::handler::Handler;
use crate::operation::{
    Operation, OperationError, OperationMeta, Operations, Properties, Property, PropertyKind,
    PropertyValue, Usage, operation_meta,
};
use async_trait::async_trait;

pub const ID: &str = "command.id";
pub const IDS: &str = "command.ids";
pub const INCLUDE_INTERNAL: &str = "command.include_internal";
pub const DESCRIPTION: &str = "command.description";
pub const HELP: &str = "command.help";
pub const DEFINITION: &str = "command.definition";
pub const ARGS: &str = "command.args";
pub const ENV: &str = "command.env";
pub const EXIT_CODE: &str = "command.exit_code";

fn id_property() -> Property {
    Property::new(ID, PropertyKind::String)
        .label("Command")
        .usage(Usage::required())
}

fn output(id: &str, kind: PropertyKind, label: &str) -> Property {
    Property::new(id, kind).label(label).usage(Usage::output())
}

pub struct CommandListOperation {
    meta: OperationMeta,
    properties: Properties,
    commands: CommandsWrapper,
}

impl CommandListOperation {
    pub fn new(commands: CommandsWrapper) -> Self {
        Self {
            meta: OperationMeta::new(
                "command.list",
                "List commands",
                "List the commands defined in commands.yml.",
            ),
            properties: Properties::new()
                .with(
                    Property::new(INCLUDE_INTERNAL, PropertyKind::Bool)
                        .label("Include internal")
                        .default_value(PropertyValue::Bool(false)),
                )
                .with(output(IDS, PropertyKind::StringList, "Commands")),
            commands,
        }
    }
}

#[async_trait]
impl Operation for CommandListOperation {
    operation_meta!();

    async fn exec(&mut self) -> Result<(), OperationError> {
        let include_internal = self.properties.bool(INCLUDE_INTERNAL).unwrap_or(false);
        let ids = self
            .commands
            .list()?
            .into_iter()
            .filter(|(_, command)| include_internal || !command.internal)
            .map(|(id, _)| id)
            .collect();
        self.properties.set(IDS, PropertyValue::StringList(ids))?;
        Ok(())
    }
}

pub struct CommandGetOperation {
    meta: OperationMeta,
    properties: Properties,
    commands: CommandsWrapper,
}

impl CommandGetOperation {
    pub fn new(commands: CommandsWrapper) -> Self {
        Self {
            meta: OperationMeta::new("command.get", "Show command", "Describe one command."),
            properties: Properties::new()
                .with(id_property())
                .with(output(DESCRIPTION, PropertyKind::String, "Description"))
                .with(output(HELP, PropertyKind::String, "Help"))
                .with(output(DEFINITION, PropertyKind::Yaml, "Definition")),
            commands,
        }
    }
}

#[async_trait]
impl Operation for CommandGetOperation {
    operation_meta!();

    async fn exec(&mut self) -> Result<(), OperationError> {
        let id = self.properties.string(ID).unwrap_or_default().to_string();
        let command = self
            .commands
            .get(&id)?
            .ok_or_else(|| OperationError::failed(format!("unknown command: {id}")))?;

        let definition = serde_yaml::to_value(&command)
            .map_err(|e| OperationError::failed(format!("cannot render command {id}: {e}")))?;

        self.properties
            .set(DESCRIPTION, PropertyValue::String(command.description))?;
        self.properties
            .set(HELP, PropertyValue::String(command.help))?;
        self.properties
            .set(DEFINITION, PropertyValue::Yaml(definition))?;
        Ok(())
    }
}

pub struct CommandExecOperation {
    meta: OperationMeta,
    properties: Properties,
    commands: CommandsWrapper,
    context: CommandContext,
}

impl CommandExecOperation {
    pub fn new(commands: CommandsWrapper, context: CommandContext) -> Self {
        Self {
            meta: OperationMeta::new("command.exec", "Run command", "Run a command from commands.yml.")
                .with_help(
                    "Container commands run in a fresh container that is removed afterwards; \
                     host commands run from the project root.",
                ),
            properties: Properties::new()
                .with(id_property())
                .with(
                    Property::new(ARGS, PropertyKind::StringList)
                        .label("Arguments")
                        .description("Appended to the command line."),
                )
                .with(
                    Property::new(ENV, PropertyKind::StringMap)
                        .label("Environment")
                        .description("Extra variables, overriding configured ones."),
                )
                .with(output(EXIT_CODE, PropertyKind::Int, "Exit code")),
            commands,
            context,
        }
    }
}

#[async_trait]
impl Operation for CommandExecOperation {
    operation_meta!();

    async fn exec(&mut self) -> Result<(), OperationError> {
        let id = self.properties.string(ID).unwrap_or_default().to_string();
        let command = self
            .commands
            .get(&id)?
            .ok_or_else(|| OperationError::failed(format!("unknown command: {id}")))?;

        let env = self.properties.string_map(ENV).cloned().unwrap_or_default();
        let invocation = Invocation {
            id: &id,
            command: &command,
            args: self.properties.string_list(ARGS),
            env: &env,
        };
        let code = run::run(&self.context, &invocation).await?;

        self.properties.set(EXIT_CODE, PropertyValue::Int(code))?;
        if code != 0 {
            return Err(OperationError::CommandFailed { command: id, code });
        }
        Ok(())
    }
}

pub struct CommandHandler {
    commands: CommandsWrapper,
    context: CommandContext,
}

impl CommandHandler {
    pub fn new(config: ConfigWrapper, context: CommandContext) -> Self {
        Self {
            commands: CommandsWrapper::new(config),
            context,
        }
    }
}

impl Handler for CommandHandler {
    fn id(&self) -> &'static str {
        "local.command"
    }

    fn operations(&self) -> Operations {
        Operations::new()
            .with(CommandListOperation::new(self.commands.clone()))
            .with(CommandGetOperation::new(self.commands.clone()))
            .with(CommandExecOperation::new(
                self.commands.clone(),
                self.context.clone(),
            ))
    }
}

// ABOUTME: config.* operations: raw scoped access to keys in the local config directories.
// ABOUTME: Values are the unparsed bytes of <scope dir>/<key>.yml.

use crate::config::ConfigWrapper;
use crate::handler::Handler;
use crate::operation::{
    Operation, OperationError, OperationMeta, Operations, Properties, Property, PropertyKind,
    PropertyValue, Usage, operation_meta,
};
use async_trait::async_trait;

pub const KEY: &str = "config.key";
pub const VALUE: &str = "config.value";
pub const KEYS: &str = "config.keys";

fn key_property() -> Property {
    Property::new(KEY, PropertyKind::String)
        .label("Key")
        .description("Config key, the file name without .yml.")
        .usage(Usage::required())
}

pub struct ConfigListOperation {
    meta: OperationMeta,
    properties: Properties,
    config: ConfigWrapper,
}

impl ConfigListOperation {
    pub fn new(config: ConfigWrapper) -> Self {
        Self {
            meta: OperationMeta::new("config.list", "List config", "List config keys across all scopes."),
            properties: Properties::new().with(
                Property::new(KEYS, PropertyKind::StringList)
                    .label("Keys")
                    .usage(Usage::output()),
            ),
            config,
        }
    }
}

#[async_trait]
impl Operation for ConfigListOperation {
    operation_meta!();

    async fn exec(&mut self) -> Result<(), OperationError> {
        let keys = self.config.list()?;
        self.properties.set(KEYS, PropertyValue::StringList(keys))?;
        Ok(())
    }
}

pub struct ConfigGetOperation {
    meta: OperationMeta,
    properties: Properties,
    config: ConfigWrapper,
}

impl ConfigGetOperation {
    pub fn new(config: ConfigWrapper) -> Self {
        Self {
            meta: OperationMeta::new(
                "config.get",
                "Get config",
                "Read a config key from every scope that has it.",
            ),
            properties: Properties::new().with(key_property()).with(
                Property::new(VALUE, PropertyKind::ScopedValues)
                    .label("Value")
                    .description("Contents per scope, most general first.")
                    .usage(Usage::output()),
            ),
            config,
        }
    }
}

#[async_trait]
impl Operation for ConfigGetOperation {
    operation_meta!();

    async fn exec(&mut self) -> Result<(), OperationError> {
        let key = self.properties.string(KEY).unwrap_or_default().to_string();
        let values = self.config.get(&key)?;
        self.properties
            .set(VALUE, PropertyValue::ScopedValues(values))?;
        Ok(())
    }
}

pub struct ConfigSetOperation {
    meta: OperationMeta,
    properties: Properties,
    config: ConfigWrapper,
}

impl ConfigSetOperation {
    pub fn new(config: ConfigWrapper) -> Self {
        Self {
            meta: OperationMeta::new(
                "config.set",
                "Set config",
                "Replace the contents of a config key in the given scopes.",
            )
            .with_help("Pass the value as `scope=contents`, for example `project=name: demo`."),
            properties: Properties::new().with(key_property()).with(
                Property::new(VALUE, PropertyKind::ScopedValues)
                    .label("Value")
                    .usage(Usage::required()),
            ),
            config,
        }
    }
}

#[async_trait]
impl Operation for ConfigSetOperation {
    operation_meta!();

    async fn exec(&mut self) -> Result<(), OperationError> {
        let key = self.properties.string(KEY).unwrap_or_default();
        let values = self
            .properties
            .scoped_values(VALUE)
            .cloned()
            .unwrap_or_default();
        self.config.set(key, &values)?;
        Ok(())
    }
}

pub struct ConfigHandler {
    config: ConfigWrapper,
}

impl ConfigHandler {
    pub fn new(config: ConfigWrapper) -> Self {
        Self { config }
    }
}

impl Handler for ConfigHandler {
    fn id(&self) -> &'static str {
        "local.config"
    }

    fn operations(&self) -> Operations {
        Operations::new()
            .with(ConfigListOperation::new(self.config.clone()))
            .with(ConfigGetOperation::new(self.config.clone()))
            .with(ConfigSetOperation::new(self.config.clone()))
    }
}

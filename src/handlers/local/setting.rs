// ABOUTME: setting.* operations over the merged settings.yml of the local scopes.
// ABOUTME: Reads merge scopes, writes go to a single scope.

use crate::config::{ConfigWrapper, DEFAULT_SCOPE, SettingsWrapper};
use crate::handler::Handler;
use crate::operation::{
    Operation, OperationError, OperationMeta, Operations, Properties, Property, PropertyKind,
    PropertyValue, Usage, operation_meta,
};
use async_trait::async_trait;
use indexmap::IndexMap;

pub const KEY: &str = "setting.key";
pub const VALUE: &str = "setting.value";
pub const SCOPE: &str = "setting.scope";
pub const SCOPES: &str = "setting.scopes";
pub const KEYS: &str = "setting.keys";

fn key_property() -> Property {
    Property::new(KEY, PropertyKind::String)
        .label("Key")
        .usage(Usage::required())
}

pub struct SettingListOperation {
    meta: OperationMeta,
    properties: Properties,
    settings: SettingsWrapper,
}

impl SettingListOperation {
    pub fn new(settings: SettingsWrapper) -> Self {
        Self {
            meta: OperationMeta::new("setting.list", "List settings", "List setting keys."),
            properties: Properties::new().with(
                Property::new(KEYS, PropertyKind::StringList)
                    .label("Keys")
                    .usage(Usage::output()),
            ),
            settings,
        }
    }
}

#[async_trait]
impl Operation for SettingListOperation {
    operation_meta!();

    async fn exec(&mut self) -> Result<(), OperationError> {
        let keys = self.settings.list()?;
        self.properties.set(KEYS, PropertyValue::StringList(keys))?;
        Ok(())
    }
}

pub struct SettingGetOperation {
    meta: OperationMeta,
    properties: Properties,
    settings: SettingsWrapper,
}

impl SettingGetOperation {
    pub fn new(settings: SettingsWrapper) -> Self {
        Self {
            meta: OperationMeta::new(
                "setting.get",
                "Get setting",
                "Read a setting; the most specific scope wins.",
            ),
            properties: Properties::new()
                .with(key_property())
                .with(
                    Property::new(VALUE, PropertyKind::Yaml)
                        .label("Value")
                        .usage(Usage::output()),
                )
                .with(
                    Property::new(SCOPES, PropertyKind::StringMap)
                        .label("Per scope")
                        .description("The value as written in each scope that sets it.")
                        .usage(Usage::output()),
                ),
            settings,
        }
    }
}

#[async_trait]
impl Operation for SettingGetOperation {
    operation_meta!();

    async fn exec(&mut self) -> Result<(), OperationError> {
        let key = self.properties.string(KEY).unwrap_or_default().to_string();

        let scoped = self.settings.get_scoped(&key)?;
        let Some(value) = scoped.values().last().cloned() else {
            return Err(OperationError::failed(format!("setting {key} is not set")));
        };

        let mut per_scope = IndexMap::new();
        for (scope, value) in scoped {
            per_scope.insert(scope, PropertyValue::Yaml(value).to_string());
        }

        self.properties.set(VALUE, PropertyValue::Yaml(value))?;
        self.properties
            .set(SCOPES, PropertyValue::StringMap(per_scope))?;
        Ok(())
    }
}

pub struct SettingSetOperation {
    meta: OperationMeta,
    properties: Properties,
    settings: SettingsWrapper,
}

impl SettingSetOperation {
    pub fn new(settings: SettingsWrapper) -> Self {
        Self {
            meta: OperationMeta::new(
                "setting.set",
                "Set setting",
                "Write a setting into one scope.",
            ),
            properties: Properties::new()
                .with(key_property())
                .with(
                    Property::new(VALUE, PropertyKind::Yaml)
                        .label("Value")
                        .description("YAML value.")
                        .usage(Usage::required()),
                )
                .with(
                    Property::new(SCOPE, PropertyKind::String)
                        .label("Scope")
                        .default_value(PropertyValue::String(DEFAULT_SCOPE.to_string())),
                ),
            settings,
        }
    }
}

#[async_trait]
impl Operation for SettingSetOperation {
    operation_meta!();

    async fn exec(&mut self) -> Result<(), OperationError> {
        let key = self.properties.string(KEY).unwrap_or_default();
        let scope = self.properties.string(SCOPE).unwrap_or(DEFAULT_SCOPE);
        let value = self
            .properties
            .yaml(VALUE)
            .cloned()
            .unwrap_or(serde_yaml::Value::Null);
        self.settings.set(key, value, scope)?;
        Ok(())
    }
}

pub struct SettingHandler {
    settings: SettingsWrapper,
}

impl SettingHandler {
    pub fn new(config: ConfigWrapper) -> Self {
        Self {
            settings: SettingsWrapper::new(config),
        }
    }
}

impl Handler for SettingHandler {
    fn id(&self) -> &'static str {
        "local.setting"
    }

    fn operations(&self) -> Operations {
        Operations::new()
            .with(SettingListOperation::new(self.settings.clone()))
            .with(SettingGetOperation::new(self.settings.clone()))
            .with(SettingSetOperation::new(self.settings.clone()))
    }
}

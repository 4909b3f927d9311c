// ABOUTME: monitor and provision operations against the UpCloud API.
// ABOUTME: One operation type; the kind decides its implementation, properties and API calls.

use super::{ServerTemplate, UpcloudContext};
use crate::handler::{Handler, Implementation};
use crate::operation::{
    Operation, OperationError, OperationMeta, Operations, Properties, Property, PropertyKind,
    PropertyValue, Usage, operation_meta,
};
use crate::types::ServerUuid;
use async_trait::async_trait;
use indexmap::IndexMap;
use std::time::Duration;

/// Property ids of the upcloud operations.
pub mod props {
    pub const INFO: &str = "monitor.info";
    pub const SERVERS: &str = "upcloud.servers";
    pub const SERVER: &str = "upcloud.server";
    pub const UUID: &str = "upcloud.server.uuid";
    pub const STATE: &str = "upcloud.server.state";
    pub const TEMPLATE: &str = "upcloud.server.template";
    pub const HOSTNAME: &str = "upcloud.server.hostname";
    pub const TITLE: &str = "upcloud.server.title";
    pub const ZONE: &str = "upcloud.server.zone";
    pub const PLAN: &str = "upcloud.server.plan";
    pub const STORAGE: &str = "upcloud.server.storage";
    pub const STORAGE_SIZE: &str = "upcloud.server.storage_size";
    pub const ZONES: &str = "upcloud.zones";
    pub const PLANS: &str = "upcloud.plans";
    pub const STOP_TIMEOUT: &str = "upcloud.stop.timeout";
}

use props::*;

const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Info,
    Servers,
    Server,
    Zones,
    Plans,
    Create,
    Start,
    Stop,
    Remove,
}

impl Kind {
    fn for_implementation(implementation: Implementation) -> &'static [Kind] {
        match implementation {
            Implementation::Monitor => &[Kind::Info, Kind::Servers, Kind::Server],
            Implementation::Provision => &[
                Kind::Zones,
                Kind::Plans,
                Kind::Create,
                Kind::Start,
                Kind::Stop,
                Kind::Remove,
            ],
            _ => &[],
        }
    }

    fn meta(self) -> OperationMeta {
        match self {
            Kind::Info => OperationMeta::new("monitor.info", "Account", "Show the API user and remaining credits."),
            Kind::Servers => OperationMeta::new("monitor.servers", "Servers", "List the account's servers."),
            Kind::Server => OperationMeta::new("monitor.server", "Server", "Show one server in detail."),
            Kind::Zones => OperationMeta::new("provision.zones", "Zones", "List the available zones."),
            Kind::Plans => OperationMeta::new("provision.plans", "Plans", "List the available server plans."),
            Kind::Create => OperationMeta::new("provision.create", "Create server", "Create a server.")
                .with_help(
                    "Starts from the settings template named by upcloud.server.template; \
                     explicit upcloud.server.* properties override its fields.",
                ),
            Kind::Start => OperationMeta::new("provision.start", "Start server", "Start a stopped server."),
            Kind::Stop => OperationMeta::new("provision.stop", "Stop server", "Soft-stop a running server."),
            Kind::Remove => OperationMeta::new("provision.remove", "Remove server", "Delete a stopped server."),
        }
    }

    fn properties(self) -> Properties {
        let uuid = Property::new(UUID, PropertyKind::String)
            .label("Server")
            .usage(Usage::required());
        let text = |id: &str, label: &str| Property::new(id, PropertyKind::String).label(label);
        let state = text(STATE, "State").usage(Usage::output());
        let lines = |id: &str, label: &str| {
            Property::new(id, PropertyKind::StringList)
                .label(label)
                .usage(Usage::output())
        };

        match self {
            Kind::Info => Properties::new().with(
                Property::new(INFO, PropertyKind::StringMap)
                    .label("Account")
                    .usage(Usage::output()),
            ),
            Kind::Servers => Properties::new().with(
                lines(SERVERS, "Servers").description("One `uuid hostname state zone` line per server."),
            ),
            Kind::Server => Properties::new().with(uuid).with(
                Property::new(SERVER, PropertyKind::Yaml)
                    .label("Details")
                    .usage(Usage::output()),
            ),
            Kind::Zones => Properties::new().with(lines(ZONES, "Zones")),
            Kind::Plans => Properties::new().with(lines(PLANS, "Plans")),
            Kind::Create => Properties::new()
                .with(text(TEMPLATE, "Template"))
                .with(text(HOSTNAME, "Hostname"))
                .with(text(TITLE, "Title"))
                .with(text(ZONE, "Zone"))
                .with(text(PLAN, "Plan"))
                .with(text(STORAGE, "Storage").description("Storage template uuid to clone."))
                .with(Property::new(STORAGE_SIZE, PropertyKind::Int).label("Storage size (GB)"))
                .with(text(UUID, "Server").usage(Usage::output()))
                .with(state),
            Kind::Start | Kind::Remove => Properties::new().with(uuid).with(state),
            Kind::Stop => Properties::new()
                .with(uuid)
                .with(
                    Property::new(STOP_TIMEOUT, PropertyKind::Duration)
                        .label("Timeout")
                        .description("Grace period before the server is hard-stopped.")
                        .default_value(PropertyValue::Duration(DEFAULT_STOP_TIMEOUT)),
                )
                .with(state),
        }
    }
}

pub struct UpcloudOperation {
    meta: OperationMeta,
    properties: Properties,
    kind: Kind,
    context: UpcloudContext,
}

impl UpcloudOperation {
    fn new(kind: Kind, context: UpcloudContext) -> Self {
        Self {
            meta: kind.meta(),
            properties: kind.properties(),
            kind,
            context,
        }
    }

    fn uuid(&self) -> ServerUuid {
        ServerUuid::new(self.properties.string(UUID).unwrap_or_default())
    }

    /// Template named by the properties, overlaid with any explicit fields.
    fn template(&self) -> Result<ServerTemplate, OperationError> {
        let text = |id: &str| {
            self.properties
                .string(id)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let explicit = ServerTemplate {
            hostname: text(HOSTNAME),
            title: text(TITLE),
            zone: text(ZONE),
            plan: text(PLAN),
            storage: text(STORAGE),
            storage_size: self
                .properties
                .int(STORAGE_SIZE)
                .map(|size| {
                    u32::try_from(size)
                        .map_err(|_| OperationError::failed(format!("invalid storage size: {size}")))
                })
                .transpose()?,
            os: None,
        };

        match text(TEMPLATE) {
            Some(name) => Ok(self.context.template(&name)?.overlay(&explicit)),
            None => Ok(explicit),
        }
    }

    fn set_state(&mut self, state: &str) -> Result<(), OperationError> {
        self.properties
            .set(STATE, PropertyValue::String(state.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl Operation for UpcloudOperation {
    operation_meta!();

    async fn exec(&mut self) -> Result<(), OperationError> {
        let client = self.context.client()?;

        match self.kind {
            Kind::Info => {
                let account = client.account().await?;
                let mut info = IndexMap::new();
                info.insert("username".to_string(), account.username);
                info.insert("credits".to_string(), account.credits.to_string());
                self.properties.set(INFO, PropertyValue::StringMap(info))?;
            }
            Kind::Servers => {
                let lines = client.servers().await?.iter().map(|s| s.line()).collect();
                self.properties.set(SERVERS, PropertyValue::StringList(lines))?;
            }
            Kind::Server => {
                let server = client.server(&self.uuid()).await?;
                let details = serde_yaml::to_value(&server)
                    .map_err(|e| OperationError::failed(format!("cannot render server: {e}")))?;
                self.properties.set(SERVER, PropertyValue::Yaml(details))?;
            }
            Kind::Zones => {
                let lines = client
                    .zones()
                    .await?
                    .iter()
                    .map(|z| format!("{} {}", z.id, z.description))
                    .collect();
                self.properties.set(ZONES, PropertyValue::StringList(lines))?;
            }
            Kind::Plans => {
                let lines = client.plans().await?.iter().map(|p| p.line()).collect();
                self.properties.set(PLANS, PropertyValue::StringList(lines))?;
            }
            Kind::Create => {
                let template = self.template()?;
                let request = self.context.new_server(&template)?;
                let server = client.create_server(request).await?;
                self.properties
                    .set(UUID, PropertyValue::String(server.uuid.to_string()))?;
                self.set_state(&server.state)?;
            }
            Kind::Start => {
                let server = client.start_server(&self.uuid()).await?;
                self.set_state(&server.state)?;
            }
            Kind::Stop => {
                let timeout = self
                    .properties
                    .duration(STOP_TIMEOUT)
                    .unwrap_or(DEFAULT_STOP_TIMEOUT);
                let server = client.stop_server(&self.uuid(), timeout).await?;
                self.set_state(&server.state)?;
            }
            Kind::Remove => {
                client.delete_server(&self.uuid()).await?;
                self.set_state("deleted")?;
            }
        }
        Ok(())
    }
}

/// UpCloud operations for one implementation.
pub struct UpcloudHandler {
    implementation: Implementation,
    context: UpcloudContext,
}

impl UpcloudHandler {
    pub fn new(implementation: Implementation, context: UpcloudContext) -> Self {
        Self {
            implementation,
            context,
        }
    }
}

impl Handler for UpcloudHandler {
    fn id(&self) -> &'static str {
        match self.implementation {
            Implementation::Monitor => "upcloud.monitor",
            _ => "upcloud.provision",
        }
    }

    fn operations(&self) -> Operations {
        let mut operations = Operations::new();
        for kind in Kind::for_implementation(self.implementation) {
            operations.add(Box::new(UpcloudOperation::new(*kind, self.context.clone())));
        }
        operations
    }
}

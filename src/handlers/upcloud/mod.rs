// ABOUTME: The upcloud builder: inspect the account and provision servers on UpCloud.
// ABOUTME: Named server templates in the settings fill in create requests.

mod client;
mod operations;
mod types;

pub use client::{DEFAULT_URL, UpcloudClient};
pub use operations::{UpcloudHandler, UpcloudOperation, props};
pub use types::{Account, NewServer, Plan, Server, StorageDevice, StorageDevices, Zone};

use crate::config::EnvValue;
use crate::diagnostics::Diagnostics;
use crate::handler::{
    BuildError, Builder, BuilderSettings, HandlerSet, Implementation, supported_implementations,
};
use crate::operation::{OperationError, Operations};
use crate::rest::{Credentials, DEFAULT_TIMEOUT};
use indexmap::IndexMap;
use serde::Deserialize;
use std::time::Duration;

pub const BUILDER_ID: &str = "upcloud";

pub const DEFAULT_STORAGE_SIZE: u32 = 25;

const SUPPORTED: &[Implementation] = &[Implementation::Monitor, Implementation::Provision];

/// A named recipe for `provision.create`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerTemplate {
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub plan: Option<String>,
    /// Storage template uuid to clone.
    #[serde(default)]
    pub storage: Option<String>,
    #[serde(default)]
    pub storage_size: Option<u32>,
    /// Label for the cloned disk.
    #[serde(default)]
    pub os: Option<String>,
}

impl ServerTemplate {
    /// `other`'s fields where set, ours otherwise.
    pub fn overlay(&self, other: &ServerTemplate) -> ServerTemplate {
        fn pick<T: Clone>(top: &Option<T>, base: &Option<T>) -> Option<T> {
            top.clone().or_else(|| base.clone())
        }
        ServerTemplate {
            hostname: pick(&other.hostname, &self.hostname),
            title: pick(&other.title, &self.title),
            zone: pick(&other.zone, &self.zone),
            plan: pick(&other.plan, &self.plan),
            storage: pick(&other.storage, &self.storage),
            storage_size: pick(&other.storage_size, &self.storage_size),
            os: pick(&other.os, &self.os),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpcloudSettings {
    pub username: EnvValue,
    pub password: EnvValue,
    #[serde(default = "default_url")]
    pub url: String,
    /// Zone for servers whose template names none.
    #[serde(default)]
    pub zone: Option<String>,
    #[serde(default)]
    pub plan: Option<String>,
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
    #[serde(default)]
    pub servers: IndexMap<String, ServerTemplate>,
}

fn default_url() -> String {
    DEFAULT_URL.to_string()
}

#[derive(Debug, Clone)]
pub struct UpcloudContext {
    pub settings: UpcloudSettings,
}

impl UpcloudContext {
    pub fn new(settings: UpcloudSettings) -> Self {
        Self { settings }
    }

    pub fn client(&self) -> Result<UpcloudClient, OperationError> {
        let credentials = Credentials {
            username: self.settings.username.resolve()?,
            password: self.settings.password.resolve()?,
        };
        let timeout = self.settings.timeout.unwrap_or(DEFAULT_TIMEOUT);
        Ok(UpcloudClient::new(&self.settings.url, credentials, timeout)?)
    }

    pub fn template(&self, name: &str) -> Result<&ServerTemplate, OperationError> {
        self.settings
            .servers
            .get(name)
            .ok_or_else(|| OperationError::failed(format!("unknown server template: {name}")))
    }

    /// Create request for `template`, with builder-wide zone and plan as fallbacks.
    pub fn new_server(&self, template: &ServerTemplate) -> Result<NewServer, OperationError> {
        let required = |value: &Option<String>, field: &str| {
            value
                .clone()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| OperationError::failed(format!("server {field} is not set")))
        };

        let hostname = required(&template.hostname, "hostname")?;
        let zone = required(&template.zone.clone().or_else(|| self.settings.zone.clone()), "zone")?;
        let plan = required(&template.plan.clone().or_else(|| self.settings.plan.clone()), "plan")?;
        let storage = required(&template.storage, "storage")?;
        let disk = match template.os {
            Some(ref os) => format!("{hostname} {os}"),
            None => format!("{hostname} disk"),
        };

        Ok(NewServer {
            title: template.title.clone().unwrap_or_else(|| hostname.clone()),
            zone,
            plan,
            storage_devices: StorageDevices {
                storage_device: vec![StorageDevice {
                    action: "clone".to_string(),
                    storage,
                    title: disk,
                    size: template.storage_size.unwrap_or(DEFAULT_STORAGE_SIZE),
                }],
            },
            hostname,
        })
    }
}

#[derive(Default)]
pub struct UpcloudBuilder {
    handlers: HandlerSet,
}

impl UpcloudBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Builder for UpcloudBuilder {
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
        let upcloud: UpcloudSettings = settings.decode(BUILDER_ID)?;
        if url::Url::parse(&upcloud.url).is_err() {
            return Err(BuildError::invalid(BUILDER_ID, format!("invalid url: {}", upcloud.url)));
        }
        let context = UpcloudContext::new(upcloud);

        self.handlers.clear();
        for implementation in accepted {
            self.handlers
                .push(UpcloudHandler::new(implementation, context.clone()));
        }
        Ok(())
    }

    fn operations(&self) -> Operations {
        self.handlers.operations()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(yaml: &str) -> UpcloudContext {
        UpcloudContext::new(serde_yaml::from_str(yaml).unwrap())
    }

    const SETTINGS: &str = r#"
username: api-user
password: { env: UPCLOUD_PASSWORD, default: secret }
zone: fi-hel1
plan: 1xCPU-1GB
servers:
  web:
    hostname: web1.example.com
    storage: 01000000-0000-4000-8000-000030200200
    os: Ubuntu
"#;

    #[test]
    fn template_falls_back_to_builder_defaults() {
        let context = context(SETTINGS);
        let server = context.new_server(context.template("web").unwrap()).unwrap();

        assert_eq!(server.zone, "fi-hel1");
        assert_eq!(server.plan, "1xCPU-1GB");
        assert_eq!(server.title, "web1.example.com");
        let disk = &server.storage_devices.storage_device[0];
        assert_eq!(disk.action, "clone");
        assert_eq!(disk.title, "web1.example.com Ubuntu");
        assert_eq!(disk.size, DEFAULT_STORAGE_SIZE);
    }

    #[test]
    fn missing_storage_is_an_error() {
        let context = context(SETTINGS);
        let template = ServerTemplate {
            hostname: Some("db1".into()),
            ..Default::default()
        };
        let err = context.new_server(&template).unwrap_err();
        assert!(err.to_string().contains("storage"));
    }

    #[test]
    fn overlay_prefers_explicit_fields() {
        let base = ServerTemplate {
            hostname: Some("web1".into()),
            plan: Some("1xCPU-1GB".into()),
            ..Default::default()
        };
        let explicit = ServerTemplate {
            plan: Some("2xCPU-4GB".into()),
            ..Default::default()
        };
        let merged = base.overlay(&explicit);
        assert_eq!(merged.hostname.as_deref(), Some("web1"));
        assert_eq!(merged.plan.as_deref(), Some("2xCPU-4GB"));
    }

    #[test]
    fn url_defaults_to_public_api() {
        assert_eq!(context(SETTINGS).settings.url, DEFAULT_URL);
    }
}

// ABOUTME: UpCloud API 1.2 resources and the nested envelopes the API wraps them in.

use crate::types::ServerUuid;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct AccountEnvelope {
    pub account: Account,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Account {
    pub username: String,
    #[serde(default)]
    pub credits: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZonesEnvelope {
    pub zones: ZoneList,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneList {
    #[serde(default)]
    pub zone: Vec<Zone>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Zone {
    pub id: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlansEnvelope {
    pub plans: PlanList,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanList {
    #[serde(default)]
    pub plan: Vec<Plan>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Plan {
    pub name: String,
    #[serde(default)]
    pub core_number: u32,
    #[serde(default)]
    pub memory_amount: u32,
    #[serde(default)]
    pub storage_size: u32,
}

impl Plan {
    pub fn line(&self) -> String {
        format!(
            "{} {}cpu {}MB {}GB",
            self.name, self.core_number, self.memory_amount, self.storage_size
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServersEnvelope {
    pub servers: ServerList,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerList {
    #[serde(default)]
    pub server: Vec<Server>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerEnvelope {
    pub server: Server,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Server {
    pub uuid: ServerUuid,
    #[serde(default)]
    pub hostname: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub zone: String,
    #[serde(default)]
    pub plan: String,
    #[serde(default)]
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_addresses: Option<IpAddresses>,
}

impl Server {
    /// `uuid hostname state zone` as shown by monitor.servers.
    pub fn line(&self) -> String {
        format!("{} {} {} {}", self.uuid, self.hostname, self.state, self.zone)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct IpAddresses {
    #[serde(default)]
    pub ip_address: Vec<IpAddress>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct IpAddress {
    pub address: String,
    #[serde(default)]
    pub access: String,
    #[serde(default)]
    pub family: String,
}

/// Body of `POST server`.
#[derive(Debug, Clone, Serialize)]
pub struct CreateServerRequest {
    pub server: NewServer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewServer {
    pub zone: String,
    pub title: String,
    pub hostname: String,
    pub plan: String,
    pub storage_devices: StorageDevices,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageDevices {
    pub storage_device: Vec<StorageDevice>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageDevice {
    pub action: String,
    pub storage: String,
    pub title: String,
    pub size: u32,
}

/// Body of `POST server/{uuid}/stop`.
#[derive(Debug, Clone, Serialize)]
pub struct StopServerRequest {
    pub stop_server: StopServer,
}

#[derive(Debug, Clone, Serialize)]
pub struct StopServer {
    pub stop_type: String,
    /// Seconds, as a string.
    pub timeout: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_list_decodes() {
        let json = r#"{"servers":{"server":[{"uuid":"00798b85-efdc-41ca-8021-f6ef457b8531","hostname":"web1","title":"Web","zone":"fi-hel1","plan":"1xCPU-1GB","state":"started","tags":{"tag":[]}}]}}"#;
        let envelope: ServersEnvelope = serde_json::from_str(json).unwrap();
        let server = &envelope.servers.server[0];
        assert_eq!(server.line(), "00798b85-efdc-41ca-8021-f6ef457b8531 web1 started fi-hel1");
    }

    #[test]
    fn stop_request_shape() {
        let body = serde_json::to_value(StopServerRequest {
            stop_server: StopServer {
                stop_type: "soft".into(),
                timeout: "60".into(),
            },
        })
        .unwrap();
        assert_eq!(body["stop_server"]["stop_type"], "soft");
        assert_eq!(body["stop_server"]["timeout"], "60");
    }
}

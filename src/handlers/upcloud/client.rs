// ABOUTME: Typed client for the UpCloud API endpoints radi uses.
// ABOUTME: Requests are authenticated with the account's API user over basic auth.

use super::types::{
    Account, AccountEnvelope, CreateServerRequest, NewServer, Plan, PlansEnvelope, Server,
    ServerEnvelope, ServersEnvelope, StopServer, StopServerRequest, Zone, ZonesEnvelope,
};
use crate::operation::whole_seconds;
use crate::rest::{ApiError, Credentials, RestClient};
use crate::types::ServerUuid;
use std::time::Duration;
use urlencoding::encode;

pub const DEFAULT_URL: &str = "https://api.upcloud.com/1.2/";

#[derive(Debug, Clone)]
pub struct UpcloudClient {
    rest: RestClient,
}

impl UpcloudClient {
    pub fn new(url: &str, credentials: Credentials, timeout: Duration) -> Result<Self, ApiError> {
        Ok(Self {
            rest: RestClient::new(url, Some(credentials), timeout)?,
        })
    }

    fn server_path(uuid: &ServerUuid) -> String {
        format!("server/{}", encode(uuid.as_str()))
    }

    pub async fn account(&self) -> Result<Account, ApiError> {
        let envelope: AccountEnvelope = self.rest.get("account").await?;
        Ok(envelope.account)
    }

    pub async fn zones(&self) -> Result<Vec<Zone>, ApiError> {
        let envelope: ZonesEnvelope = self.rest.get("zone").await?;
        Ok(envelope.zones.zone)
    }

    pub async fn plans(&self) -> Result<Vec<Plan>, ApiError> {
        let envelope: PlansEnvelope = self.rest.get("plan").await?;
        Ok(envelope.plans.plan)
    }

    pub async fn servers(&self) -> Result<Vec<Server>, ApiError> {
        let envelope: ServersEnvelope = self.rest.get("server").await?;
        Ok(envelope.servers.server)
    }

    pub async fn server(&self, uuid: &ServerUuid) -> Result<Server, ApiError> {
        let envelope: ServerEnvelope = self.rest.get(&Self::server_path(uuid)).await?;
        Ok(envelope.server)
    }

    pub async fn create_server(&self, server: NewServer) -> Result<Server, ApiError> {
        tracing::info!(hostname = %server.hostname, zone = %server.zone, "creating server");
        let envelope: ServerEnvelope = self
            .rest
            .post("server", &CreateServerRequest { server })
            .await?;
        Ok(envelope.server)
    }

    pub async fn start_server(&self, uuid: &ServerUuid) -> Result<Server, ApiError> {
        tracing::info!(server = %uuid, "starting server");
        let path = format!("{}/start", Self::server_path(uuid));
        let envelope: ServerEnvelope = self.rest.post(&path, &serde_json::Map::new()).await?;
        Ok(envelope.server)
    }

    /// Soft stop; the API hard-stops after `timeout`.
    pub async fn stop_server(&self, uuid: &ServerUuid, timeout: Duration) -> Result<Server, ApiError> {
        tracing::info!(server = %uuid, timeout = ?timeout, "stopping server");
        let path = format!("{}/stop", Self::server_path(uuid));
        let body = StopServerRequest {
            stop_server: StopServer {
                stop_type: "soft".to_string(),
                timeout: whole_seconds(timeout).to_string(),
            },
        };
        let envelope: ServerEnvelope = self.rest.post(&path, &body).await?;
        Ok(envelope.server)
    }

    pub async fn delete_server(&self, uuid: &ServerUuid) -> Result<(), ApiError> {
        tracing::info!(server = %uuid, "deleting server");
        self.rest.delete(&Self::server_path(uuid)).await
    }
}

// ABOUTME: Rancher v2-beta API resources: environments, stacks and services.
// ABOUTME: Only the fields radi reads or writes are modelled.

use crate::types::{EnvironmentId, ServiceId, StackId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Rancher sends `null` for fields of resources that are still transitioning.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Rancher wraps every list in a collection object.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Collection<T> {
    #[serde(default = "Vec::new", deserialize_with = "null_as_default")]
    pub data: Vec<T>,
}

/// A Rancher environment; the API calls these projects.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub id: EnvironmentId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: String,
}

impl Environment {
    pub fn line(&self) -> String {
        format!("{} {} {}", self.id, self.name, self.state)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stack {
    pub id: StackId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(default)]
    pub health_state: Option<String>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: ServiceId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: String,
    #[serde(default)]
    pub scale: Option<i64>,
    #[serde(default)]
    pub health_state: Option<String>,
}

impl Service {
    /// `name state scale` as shown by monitor.ps.
    pub fn line(&self) -> String {
        let scale = self
            .scale
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        format!("{} {} {}", self.name, self.state, scale)
    }
}

/// Body of a stack create request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStack {
    pub name: String,
    pub docker_compose: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rancher_compose: Option<String>,
    pub start_on_create: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackAction {
    Activate,
    Deactivate,
}

impl StackAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            StackAction::Activate => "activateservices",
            StackAction::Deactivate => "deactivateservices",
        }
    }
}

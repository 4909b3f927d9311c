// ABOUTME: Runtime type definitions for Docker and Podman engines.
// ABOUTME: RuntimeType, the resolved socket and the explicit override settings.

use serde::{Deserialize, Serialize};

/// The container engine behind the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeType {
    Docker,
    Podman,
}

impl std::fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeType::Docker => write!(f, "docker"),
            RuntimeType::Podman => write!(f, "podman"),
        }
    }
}

/// A resolved engine socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSocket {
    pub runtime_type: RuntimeType,
    pub socket_path: String,
}

/// `runtime` / `socket` builder settings overriding auto-detection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub runtime: Option<RuntimeType>,
    #[serde(default)]
    pub socket: Option<String>,
}

impl RuntimeConfig {
    pub fn is_explicit(&self) -> bool {
        self.runtime.is_some() || self.socket.is_some()
    }
}

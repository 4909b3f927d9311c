// ABOUTME: Local engine socket detection.
// ABOUTME: Checks Podman sockets first, then Docker, unless settings name one.

use super::types::{RuntimeConfig, RuntimeSocket, RuntimeType};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    #[error("no container runtime found (checked Podman and Docker sockets)")]
    NoRuntimeFound,

    #[error("configured socket does not exist: {0}")]
    SocketMissing(String),
}

const ROOTFUL_PODMAN: &str = "/run/podman/podman.sock";
const DOCKER_SOCKET: &str = "/var/run/docker.sock";

/// Detect a container engine on this machine.
///
/// Detection order:
/// 1. Rootless Podman socket (`/run/user/$UID/podman/podman.sock`)
/// 2. Rootful Podman socket (`/run/podman/podman.sock`)
/// 3. Docker socket (`/var/run/docker.sock`)
pub fn detect_local() -> Result<RuntimeSocket, DetectionError> {
    if let Some(uid) = get_uid() {
        let rootless = format!("/run/user/{}/podman/podman.sock", uid);
        if Path::new(&rootless).exists() {
            return Ok(RuntimeSocket {
                runtime_type: RuntimeType::Podman,
                socket_path: rootless,
            });
        }
    }

    if Path::new(ROOTFUL_PODMAN).exists() {
        return Ok(RuntimeSocket {
            runtime_type: RuntimeType::Podman,
            socket_path: ROOTFUL_PODMAN.to_string(),
        });
    }

    if Path::new(DOCKER_SOCKET).exists() {
        return Ok(RuntimeSocket {
            runtime_type: RuntimeType::Docker,
            socket_path: DOCKER_SOCKET.to_string(),
        });
    }

    Err(DetectionError::NoRuntimeFound)
}

/// Explicit settings first, then `DOCKER_HOST` with a unix socket, then detection.
pub fn resolve(config: &RuntimeConfig) -> Result<RuntimeSocket, DetectionError> {
    if config.is_explicit() {
        let runtime_type = config.runtime.unwrap_or(RuntimeType::Docker);
        let socket_path = config
            .socket
            .clone()
            .unwrap_or_else(|| default_socket_path(runtime_type));
        if !Path::new(&socket_path).exists() {
            return Err(DetectionError::SocketMissing(socket_path));
        }
        return Ok(RuntimeSocket {
            runtime_type,
            socket_path,
        });
    }

    if let Some(path) = std::env::var("DOCKER_HOST")
        .ok()
        .and_then(|host| host.strip_prefix("unix://").map(str::to_string))
    {
        tracing::debug!(socket = %path, "using DOCKER_HOST");
        return Ok(RuntimeSocket {
            runtime_type: RuntimeType::Docker,
            socket_path: path,
        });
    }

    detect_local()
}

fn get_uid() -> Option<String> {
    std::env::var("UID").ok().or_else(|| {
        std::fs::read_to_string("/proc/self/status")
            .ok()
            .and_then(|s| {
                s.lines()
                    .find(|l| l.starts_with("Uid:"))
                    .and_then(|l| l.split_whitespace().nth(1))
                    .map(|s| s.to_string())
            })
    })
}

fn default_socket_path(runtime: RuntimeType) -> String {
    match runtime {
        RuntimeType::Docker => DOCKER_SOCKET.to_string(),
        RuntimeType::Podman => ROOTFUL_PODMAN.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_missing_socket_is_an_error() {
        let config = RuntimeConfig {
            runtime: Some(RuntimeType::Podman),
            socket: Some("/nonexistent/radi-test.sock".to_string()),
        };
        assert!(matches!(
            resolve(&config),
            Err(DetectionError::SocketMissing(_))
        ));
    }

    #[test]
    fn docker_host_unix_socket_is_used() {
        temp_env::with_var("DOCKER_HOST", Some("unix:///tmp/radi-docker.sock"), || {
            let socket = resolve(&RuntimeConfig::default()).unwrap();
            assert_eq!(socket.socket_path, "/tmp/radi-docker.sock");
            assert_eq!(socket.runtime_type, RuntimeType::Docker);
        });
    }
}

// ABOUTME: Local container engine access for command containers and monitoring.
// ABOUTME: Socket detection plus bollard-backed capability traits.

mod bollard;
mod detection;
mod error;
pub mod traits;
mod types;

pub use self::bollard::BollardRuntime;
pub use detection::{DetectionError, detect_local, resolve};
pub use error::{RuntimeError, RuntimeErrorKind};
pub use traits::{
    ContainerConfig, ContainerError, ContainerFilters, ContainerOps, ContainerSummary, ImageError,
    ImageOps, LogError, LogLine, LogLineStream, LogOps, LogOptions, LogStream, MountKind, RuntimeInfo,
    RuntimeInfoError, RuntimeMetadata, VolumeMount,
};
pub use types::{RuntimeConfig, RuntimeSocket, RuntimeType};

/// Resolve the engine socket from settings and connect to it.
pub fn connect(config: &RuntimeConfig) -> Result<BollardRuntime, RuntimeError> {
    let socket = resolve(config)?;
    tracing::debug!(runtime = %socket.runtime_type, socket = %socket.socket_path, "connecting to runtime");
    Ok(BollardRuntime::connect(&socket)?)
}

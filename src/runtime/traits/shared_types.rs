// ABOUTME: Shared types used across runtime trait definitions.
// ABOUTME: ContainerConfig, VolumeMount and RuntimeMetadata.

use crate::types::ImageRef;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;

/// Configuration for creating a container.
#[derive(Debug, Clone)]
pub struct ContainerConfig {
    pub name: Option<String>,
    pub image: ImageRef,
    pub env: IndexMap<String, String>,
    pub labels: HashMap<String, String>,
    pub volumes: Vec<VolumeMount>,
    /// Overrides the image CMD.
    pub command: Option<Vec<String>>,
    /// Overrides the image ENTRYPOINT.
    pub entrypoint: Option<Vec<String>>,
    pub working_dir: Option<String>,
    pub user: Option<String>,
    pub tty: bool,
}

impl ContainerConfig {
    pub fn new(image: ImageRef) -> Self {
        Self {
            name: None,
            image,
            env: IndexMap::new(),
            labels: HashMap::new(),
            volumes: Vec::new(),
            command: None,
            entrypoint: None,
            working_dir: None,
            user: None,
            tty: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountKind {
    Bind,
    Volume,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMount {
    /// Host path or volume name.
    pub source: String,
    pub target: String,
    pub read_only: bool,
    pub kind: MountKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct RuntimeMetadata {
    /// "Docker" or "Podman".
    pub name: String,
    pub version: String,
    pub api_version: String,
    pub os: String,
    pub arch: String,
}

impl RuntimeMetadata {
    pub fn to_map(&self) -> IndexMap<String, String> {
        IndexMap::from([
            ("name".to_string(), self.name.clone()),
            ("version".to_string(), self.version.clone()),
            ("api_version".to_string(), self.api_version.clone()),
            ("os".to_string(), self.os.clone()),
            ("arch".to_string(), self.arch.clone()),
        ])
    }
}

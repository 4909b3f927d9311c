// ABOUTME: The project file (.radi/project.yml): project name and builder list.
// ABOUTME: Handles discovery from any subdirectory and template generation.

use super::ConfigError;
use super::deserialize::deserialize_builders;
use crate::handler::Implementation;
use crate::types::ProjectName;
use nonempty::NonEmpty;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const RADI_DIR: &str = ".radi";
pub const PROJECT_FILENAME: &str = "project.yml";

/// One builder to activate, with the implementations it should provide.
#[derive(Debug, Clone, Deserialize)]
pub struct BuilderEntry {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub implementations: Vec<Implementation>,

    #[serde(default)]
    pub settings: serde_yaml::Mapping,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Directory containing `.radi/`. Filled in by the loader.
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub name: Option<ProjectName>,

    #[serde(deserialize_with = "deserialize_builders")]
    pub builders: NonEmpty<BuilderEntry>,
}

impl ProjectConfig {
    pub fn from_yaml(yaml: &str, root: &Path) -> Result<Self, ConfigError> {
        let mut config: ProjectConfig = serde_yaml::from_str(yaml)
            .map_err(|e| ConfigError::yaml(project_file(root).display().to_string(), e))?;
        config.root = root.to_path_buf();
        Ok(config)
    }

    /// Load the project rooted at `root`.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = project_file(root);
        let content = std::fs::read_to_string(&path)?;
        Self::from_yaml(&content, root)
    }

    /// Find the nearest project at or above `dir`.
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        for candidate in dir.ancestors() {
            if project_file(candidate).is_file() {
                tracing::debug!(root = %candidate.display(), "found project");
                return Self::load(candidate);
            }
        }

        Err(ConfigError::ProjectNotFound(dir.to_path_buf()))
    }

    /// Configured name, or one derived from the root directory.
    pub fn project_name(&self) -> ProjectName {
        if let Some(ref name) = self.name {
            return name.clone();
        }

        self.root
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(ProjectName::sanitize)
            .unwrap_or_else(ProjectName::fallback)
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.join(RADI_DIR)
    }
}

fn project_file(root: &Path) -> PathBuf {
    root.join(RADI_DIR).join(PROJECT_FILENAME)
}

/// Write a starter `.radi/project.yml` under `dir`.
pub fn init_project(dir: &Path, name: Option<&str>, force: bool) -> Result<PathBuf, ConfigError> {
    let path = project_file(dir);

    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists(path));
    }

    let name = match name {
        Some(n) => ProjectName::new(n).map_err(|e| ConfigError::Invalid(e.to_string()))?,
        None => dir
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(ProjectName::sanitize)
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "cannot derive a project name from {}, pass one explicitly",
                    dir.display()
                ))
            })?,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, template_yaml(&name))?;
    tracing::info!(path = %path.display(), "initialized project");

    Ok(path)
}

pub fn template_yaml(name: &ProjectName) -> String {
    format!(
        r#"name: {name}
builders:
  - type: local
    implementations:
      - config
      - setting
      - command
      - project
      - security
      - orchestrate
      - monitor
"#
    )
}

// ABOUTME: Docker Compose project model and the `docker compose` CLI driver.
// ABOUTME: Actions render deterministic argument vectors; runners execute them.

mod action;
mod runner;

pub use action::ComposeAction;
pub use runner::{CliComposeRunner, ComposeOutput, ComposeRunner, OutputMode};

use crate::types::ProjectName;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_COMPOSE_FILE: &str = "docker-compose.yml";
pub const DEFAULT_BINARY: &str = "docker";
/// Label compose puts on every container it creates.
pub const PROJECT_LABEL: &str = "com.docker.compose.project";

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("failed to run {binary}: {error}")]
    Spawn {
        binary: String,
        error: std::io::Error,
    },

    #[error("docker compose exited with code {code}: {stderr}")]
    Failed { code: i32, stderr: String },

    #[error("docker compose was terminated by a signal")]
    Terminated,
}

/// What `docker compose` needs to address one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposeProject {
    pub name: ProjectName,
    pub files: Vec<PathBuf>,
    pub working_dir: PathBuf,
    pub env_files: Vec<PathBuf>,
    pub profiles: Vec<String>,
}

impl ComposeProject {
    /// A project using the default compose file in `working_dir`.
    pub fn new(name: ProjectName, working_dir: impl Into<PathBuf>) -> Self {
        let working_dir = working_dir.into();
        Self {
            name,
            files: vec![working_dir.join(DEFAULT_COMPOSE_FILE)],
            working_dir,
            env_files: Vec::new(),
            profiles: Vec::new(),
        }
    }

    /// Relative paths resolve against the working directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        }
    }

    /// Compose files that are not on disk.
    pub fn missing_files(&self) -> Vec<&Path> {
        self.files
            .iter()
            .map(PathBuf::as_path)
            .filter(|f| !f.exists())
            .collect()
    }

    /// Arguments selecting this project, placed before the subcommand.
    pub fn global_args(&self) -> Vec<String> {
        let mut args = vec![
            "compose".to_string(),
            "--project-name".to_string(),
            self.name.to_string(),
            "--project-directory".to_string(),
            self.working_dir.display().to_string(),
        ];
        for file in &self.files {
            args.push("--file".to_string());
            args.push(self.resolve(file).display().to_string());
        }
        for env_file in &self.env_files {
            args.push("--env-file".to_string());
            args.push(self.resolve(env_file).display().to_string());
        }
        for profile in &self.profiles {
            args.push("--profile".to_string());
            args.push(profile.clone());
        }
        args
    }

    /// Full argument vector for `action`.
    pub fn command_args(&self, action: &ComposeAction) -> Vec<String> {
        let mut args = self.global_args();
        args.extend(action.args());
        args
    }
}

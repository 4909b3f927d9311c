// ABOUTME: Runs compose actions. CliComposeRunner shells out to `docker compose`.
// ABOUTME: Output is either captured for the caller or inherited by the terminal.

use super::{ComposeAction, ComposeError, ComposeProject, DEFAULT_BINARY};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Collect stdout and stderr into the result.
    Captured,
    /// Stream straight to the terminal.
    Inherited,
}

impl OutputMode {
    pub fn for_action(action: &ComposeAction) -> Self {
        if action.captures_output() {
            OutputMode::Captured
        } else {
            OutputMode::Inherited
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComposeOutput {
    pub stdout: String,
    pub stderr: String,
}

#[async_trait]
pub trait ComposeRunner: Send + Sync {
    async fn run(
        &self,
        project: &ComposeProject,
        action: &ComposeAction,
        mode: OutputMode,
    ) -> Result<ComposeOutput, ComposeError>;
}

#[derive(Debug, Clone)]
pub struct CliComposeRunner {
    binary: String,
}

impl CliComposeRunner {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }
}

impl Default for CliComposeRunner {
    fn default() -> Self {
        Self::new(DEFAULT_BINARY)
    }
}

#[async_trait]
impl ComposeRunner for CliComposeRunner {
    async fn run(
        &self,
        project: &ComposeProject,
        action: &ComposeAction,
        mode: OutputMode,
    ) -> Result<ComposeOutput, ComposeError> {
        let args = project.command_args(action);
        tracing::debug!(binary = %self.binary, ?args, "running compose");

        let mut command = Command::new(&self.binary);
        command.args(&args).current_dir(&project.working_dir);

        let spawn_error = |error| ComposeError::Spawn {
            binary: self.binary.clone(),
            error,
        };

        let (status, output) = match mode {
            OutputMode::Captured => {
                let output = command
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .output()
                    .await
                    .map_err(spawn_error)?;
                (
                    output.status,
                    ComposeOutput {
                        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    },
                )
            }
            OutputMode::Inherited => {
                let status = command
                    .stdin(Stdio::null())
                    .status()
                    .await
                    .map_err(spawn_error)?;
                (status, ComposeOutput::default())
            }
        };

        match status.code() {
            Some(0) => Ok(output),
            Some(code) => Err(ComposeError::Failed {
                code,
                stderr: output.stderr.trim().to_string(),
            }),
            None => Err(ComposeError::Terminated),
        }
    }
}

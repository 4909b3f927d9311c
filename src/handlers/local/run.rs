// ABOUTME: Runs a configured command, in a throwaway container or as a host process.
// ABOUTME: Container output streams to the terminal; the container is removed afterwards.

use crate::config::{
    Command, CommandKind, CommandLine, ContainerCommand, HostCommand, PullPolicy,
    resolve_env_map,
};
use crate::operation::OperationError;
use crate::runtime::{
    self, BollardRuntime, ContainerConfig, ContainerOps, ImageOps, LogLine, LogOps, LogOptions,
    LogStream, MountKind, RuntimeConfig, VolumeMount,
};
use crate::types::{ContainerId, ProjectName};
use futures::StreamExt;
use indexmap::IndexMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;

pub const PROJECT_LABEL: &str = "radi.project";
pub const COMMAND_LABEL: &str = "radi.command";

/// Where commands run and how to reach the engine.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub root: PathBuf,
    pub project: ProjectName,
    pub runtime: RuntimeConfig,
}

/// One invocation of a configured command.
#[derive(Debug)]
pub struct Invocation<'a> {
    pub id: &'a str,
    pub command: &'a Command,
    pub args: &'a [String],
    pub env: &'a IndexMap<String, String>,
}

impl Invocation<'_> {
    /// Configured environment resolved, then overridden by the caller's.
    fn environment(&self) -> Result<IndexMap<String, String>, OperationError> {
        let mut env = resolve_env_map(&self.command.environment)?;
        env.extend(self.env.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(env)
    }
}

/// Run the invocation and return its exit code.
pub async fn run(context: &CommandContext, invocation: &Invocation<'_>) -> Result<i64, OperationError> {
    let env = invocation.environment()?;
    match invocation.command.kind {
        CommandKind::Container(ref container) => {
            run_container(context, invocation, container, env).await
        }
        CommandKind::Host(ref host) => run_host(context, invocation, host, env).await,
    }
}

pub(crate) fn container_config(
    context: &CommandContext,
    invocation: &Invocation<'_>,
    command: &ContainerCommand,
    env: IndexMap<String, String>,
) -> ContainerConfig {
    let mut config = ContainerConfig::new(command.image.clone());
    config.env = env;
    config
        .labels
        .insert(PROJECT_LABEL.to_string(), context.project.to_string());
    config
        .labels
        .insert(COMMAND_LABEL.to_string(), invocation.id.to_string());
    config.volumes = command
        .volumes
        .iter()
        .map(|v| VolumeMount {
            source: if v.is_bind() {
                v.resolve_source(&context.root)
            } else {
                v.source.clone()
            },
            target: v.target.clone(),
            read_only: v.read_only,
            kind: if v.is_bind() {
                MountKind::Bind
            } else {
                MountKind::Volume
            },
        })
        .collect();
    config.entrypoint = command.entrypoint.as_ref().map(CommandLine::to_args);

    let mut cmd = command
        .cmd
        .as_ref()
        .map(CommandLine::to_args)
        .unwrap_or_default();
    cmd.extend(invocation.args.iter().cloned());
    config.command = (!cmd.is_empty()).then_some(cmd);

    config.working_dir = command.working_dir.clone();
    config.user = command.user.clone();
    config.tty = command.tty;
    config
}

async fn ensure_image(engine: &BollardRuntime, command: &ContainerCommand) -> Result<(), OperationError> {
    let pull = match command.pull {
        PullPolicy::Always => true,
        PullPolicy::Missing => !engine.image_exists(&command.image).await?,
        PullPolicy::Never => false,
    };
    if pull {
        engine.pull_image(&command.image).await?;
    }
    Ok(())
}

async fn run_container(
    context: &CommandContext,
    invocation: &Invocation<'_>,
    command: &ContainerCommand,
    env: IndexMap<String, String>,
) -> Result<i64, OperationError> {
    let engine = runtime::connect(&context.runtime)?;
    ensure_image(&engine, command).await?;

    let config = container_config(context, invocation, command, env);
    let id = engine.create_container(&config).await?;
    tracing::debug!(container = %id, command = invocation.id, "created command container");

    let outcome = attach_and_wait(&engine, &id).await;

    if let Err(e) = engine.remove_container(&id, true).await {
        tracing::warn!(container = %id, error = %e, "failed to remove command container");
    }
    outcome
}

async fn attach_and_wait(engine: &BollardRuntime, id: &ContainerId) -> Result<i64, OperationError> {
    engine.start_container(id).await?;

    let mut logs = engine.container_logs(id, &LogOptions::follow_all()).await?;
    let (mut stdout, mut stderr) = (std::io::stdout(), std::io::stderr());
    while let Some(line) = logs.next().await {
        let line = line?;
        if let Err(e) = forward_line(&line, &mut stdout, &mut stderr) {
            tracing::debug!(container = %id, error = %e, "failed to forward command output");
        }
    }

    Ok(engine.wait_container(id).await?)
}

/// Copy one container log line to the matching terminal stream.
fn forward_line(line: &LogLine, stdout: &mut impl Write, stderr: &mut impl Write) -> std::io::Result<()> {
    let out: &mut dyn Write = match line.stream {
        LogStream::Stdout => stdout,
        LogStream::Stderr => stderr,
    };
    out.write_all(line.content.as_bytes())?;
    out.flush()
}

/// Argument vector for a host command with extra arguments.
pub(crate) fn host_args(exec: &CommandLine, extra: &[String]) -> Vec<String> {
    match exec {
        CommandLine::Shell(script) if !extra.is_empty() => {
            // Extra arguments reach the script as "$@" rather than being spliced into it.
            let mut args = vec![
                "sh".to_string(),
                "-c".to_string(),
                format!("{script} \"$@\""),
                "sh".to_string(),
            ];
            args.extend(extra.iter().cloned());
            args
        }
        _ => {
            let mut args = exec.to_host_args();
            args.extend(extra.iter().cloned());
            args
        }
    }
}

async fn run_host(
    context: &CommandContext,
    invocation: &Invocation<'_>,
    command: &HostCommand,
    env: IndexMap<String, String>,
) -> Result<i64, OperationError> {
    let args = host_args(&command.exec, invocation.args);
    let Some((program, rest)) = args.split_first() else {
        return Err(OperationError::failed(format!(
            "command {} has an empty exec line",
            invocation.id
        )));
    };

    let working_dir = match command.working_dir {
        Some(ref dir) if dir.is_absolute() => dir.clone(),
        Some(ref dir) => context.root.join(dir),
        None => context.root.clone(),
    };

    tracing::debug!(command = invocation.id, program = %program, ?rest, "running host command");
    let status = tokio::process::Command::new(program)
        .args(rest)
        .current_dir(&working_dir)
        .envs(&env)
        .stdin(Stdio::inherit())
        .status()
        .await
        .map_err(|e| OperationError::failed(format!("failed to run {program}: {e}")))?;

    Ok(status.code().map(i64::from).unwrap_or(-1))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn line(stream: LogStream, content: &str) -> LogLine {
        LogLine {
            content: content.to_string(),
            stream,
        }
    }

    #[test]
    fn log_lines_go_to_their_own_stream() {
        let (mut out, mut err) = (Vec::new(), Vec::new());
        forward_line(&line(LogStream::Stdout, "ready\n"), &mut out, &mut err).unwrap();
        forward_line(&line(LogStream::Stderr, "warn\n"), &mut out, &mut err).unwrap();
        assert_eq!(out, b"ready\n");
        assert_eq!(err, b"warn\n");
    }

    #[test]
    fn write_failures_are_reported() {
        let mut out = Vec::new();
        let err = forward_line(&line(LogStream::Stderr, "boom\n"), &mut out, &mut BrokenPipe)
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe);
        assert!(out.is_empty());
    }

    #[test]
    fn shell_script_receives_extra_args_positionally() {
        let exec = CommandLine::Shell("echo hi".to_string());
        let args = host_args(&exec, &["a b".to_string()]);
        assert_eq!(args, ["sh", "-c", "echo hi \"$@\"", "sh", "a b"]);
    }

    #[test]
    fn arg_list_appends_extra_args() {
        let exec = CommandLine::Args(vec!["make".to_string()]);
        assert_eq!(host_args(&exec, &["test".to_string()]), ["make", "test"]);
    }
}

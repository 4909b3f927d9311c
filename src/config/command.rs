// ABOUTME: Command definitions loaded from commands.yml across config scopes.
// ABOUTME: A command runs either in a container (image) or on the host (exec).

use super::{ConfigError, ConfigWrapper, EnvValue};
use crate::types::ImageRef;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const COMMANDS_KEY: &str = "commands";

/// A command line given either as one shell string or as an argument list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CommandLine {
    Shell(String),
    Args(Vec<String>),
}

impl CommandLine {
    /// Argument vector for a container. Shell strings split on whitespace.
    pub fn to_args(&self) -> Vec<String> {
        match self {
            CommandLine::Shell(s) => s.split_whitespace().map(str::to_string).collect(),
            CommandLine::Args(args) => args.clone(),
        }
    }

    /// Argument vector for the host. Shell strings go through `sh -c`.
    pub fn to_host_args(&self) -> Vec<String> {
        match self {
            CommandLine::Shell(s) => vec!["sh".to_string(), "-c".to_string(), s.clone()],
            CommandLine::Args(args) => args.clone(),
        }
    }
}

/// When to pull a command's image before running it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PullPolicy {
    #[default]
    Missing,
    Always,
    Never,
}

/// `source:target[:ro|rw]` volume for a container command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeSpec {
    pub source: String,
    pub target: String,
    pub read_only: bool,
}

impl VolumeSpec {
    /// Sources starting with `.`, `/` or `~` are host paths, anything else a named volume.
    pub fn is_bind(&self) -> bool {
        self.source.starts_with(['.', '/', '~'])
    }

    /// Host path for a bind mount, relative paths resolved against `root`.
    pub fn resolve_source(&self, root: &Path) -> String {
        if let Some(rest) = self.source.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest).display().to_string();
            }
        }
        if self.source.starts_with('.') {
            return normalize(&root.join(&self.source)).display().to_string();
        }
        self.source.clone()
    }
}

/// Lexically drop `.` components and fold `..` so mounts get clean paths.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

impl FromStr for VolumeSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        let (source, target, read_only) = match parts.as_slice() {
            [source, target] => (*source, *target, false),
            [source, target, "ro"] => (*source, *target, true),
            [source, target, "rw"] => (*source, *target, false),
            [_, _, mode] => return Err(format!("invalid volume mode '{mode}' in '{s}'")),
            _ => return Err(format!("volume must be source:target[:mode], got '{s}'")),
        };

        if source.is_empty() || target.is_empty() {
            return Err(format!("volume source and target cannot be empty: '{s}'"));
        }
        if !target.starts_with('/') {
            return Err(format!("volume target must be absolute: '{target}'"));
        }

        Ok(VolumeSpec {
            source: source.to_string(),
            target: target.to_string(),
            read_only,
        })
    }
}

impl fmt::Display for VolumeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.target)?;
        if self.read_only {
            f.write_str(":ro")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContainerCommand {
    pub image: ImageRef,
    pub entrypoint: Option<CommandLine>,
    pub cmd: Option<CommandLine>,
    pub working_dir: Option<String>,
    pub volumes: Vec<VolumeSpec>,
    pub user: Option<String>,
    pub tty: bool,
    pub pull: PullPolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostCommand {
    pub exec: CommandLine,
    pub working_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandKind {
    Container(ContainerCommand),
    Host(HostCommand),
}

/// A named command a project makes available through `command.exec`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "CommandSpec", into = "CommandSpec")]
pub struct Command {
    pub description: String,
    pub help: String,
    /// Internal commands are hidden from listings but can still be run.
    pub internal: bool,
    pub environment: IndexMap<String, EnvValue>,
    pub kind: CommandKind,
}

/// Wire format of a command entry.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct CommandSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    help: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    internal: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exec: Option<CommandLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    entrypoint: Option<CommandLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cmd: Option<CommandLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    working_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    volumes: Vec<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    environment: IndexMap<String, EnvValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    tty: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pull: Option<PullPolicy>,
}

impl TryFrom<CommandSpec> for Command {
    type Error = String;

    fn try_from(spec: CommandSpec) -> Result<Self, Self::Error> {
        let kind = match (spec.image, spec.exec) {
            (Some(_), Some(_)) => {
                return Err("a command takes either `image` or `exec`, not both".to_string());
            }
            (None, None) => return Err("a command needs either `image` or `exec`".to_string()),
            (Some(image), None) => {
                let image = ImageRef::parse(&image).map_err(|e| format!("image: {e}"))?;
                let volumes = spec
                    .volumes
                    .iter()
                    .map(|v| v.parse())
                    .collect::<Result<Vec<VolumeSpec>, _>>()?;
                CommandKind::Container(ContainerCommand {
                    image,
                    entrypoint: spec.entrypoint,
                    cmd: spec.cmd,
                    working_dir: spec.working_dir,
                    volumes,
                    user: spec.user,
                    tty: spec.tty,
                    pull: spec.pull.unwrap_or_default(),
                })
            }
            (None, Some(exec)) => {
                let unsupported = [
                    ("entrypoint", spec.entrypoint.is_some()),
                    ("cmd", spec.cmd.is_some()),
                    ("volumes", !spec.volumes.is_empty()),
                    ("user", spec.user.is_some()),
                    ("pull", spec.pull.is_some()),
                ];
                if let Some((field, _)) = unsupported.iter().find(|(_, set)| *set) {
                    return Err(format!("`{field}` only applies to container commands"));
                }
                CommandKind::Host(HostCommand {
                    exec,
                    working_dir: spec.working_dir.map(PathBuf::from),
                })
            }
        };

        Ok(Command {
            description: spec.description,
            help: spec.help,
            internal: spec.internal,
            environment: spec.environment,
            kind,
        })
    }
}

impl From<Command> for CommandSpec {
    fn from(command: Command) -> Self {
        let mut spec = CommandSpec {
            description: command.description,
            help: command.help,
            internal: command.internal,
            environment: command.environment,
            ..Default::default()
        };
        match command.kind {
            CommandKind::Container(c) => {
                spec.image = Some(c.image.to_string());
                spec.entrypoint = c.entrypoint;
                spec.cmd = c.cmd;
                spec.working_dir = c.working_dir;
                spec.volumes = c.volumes.iter().map(ToString::to_string).collect();
                spec.user = c.user;
                spec.tty = c.tty;
                spec.pull = (c.pull != PullPolicy::default()).then_some(c.pull);
            }
            CommandKind::Host(h) => {
                spec.exec = Some(h.exec);
                spec.working_dir = h.working_dir.map(|p| p.display().to_string());
            }
        }
        spec
    }
}

/// Commands merged over all scopes.
#[derive(Debug, Clone)]
pub struct CommandsWrapper {
    config: ConfigWrapper,
}

impl CommandsWrapper {
    pub fn new(config: ConfigWrapper) -> Self {
        Self { config }
    }

    /// Every command by id. A more specific scope replaces a command in place.
    pub fn list(&self) -> Result<IndexMap<String, Command>, ConfigError> {
        let mut merged = IndexMap::new();
        for (scope, commands) in self.config.decode::<IndexMap<String, Command>>(COMMANDS_KEY)? {
            for (id, command) in commands {
                if merged.contains_key(&id) {
                    tracing::debug!(command = %id, scope = %scope, "command overridden");
                }
                merged.insert(id, command);
            }
        }
        Ok(merged)
    }

    pub fn get(&self, id: &str) -> Result<Option<Command>, ConfigError> {
        Ok(self.list()?.shift_remove(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_volume_specs() {
        let v: VolumeSpec = "./src:/app/src:ro".parse().unwrap();
        assert!(v.is_bind());
        assert!(v.read_only);

        let named: VolumeSpec = "cache:/root/.cache".parse().unwrap();
        assert!(!named.is_bind());
        assert!(!named.read_only);

        assert!("a:b".parse::<VolumeSpec>().is_err());
        assert!("a:/b:xx".parse::<VolumeSpec>().is_err());
    }

    #[test]
    fn relative_bind_resolves_against_root() {
        let v: VolumeSpec = "./src/../app:/app".parse().unwrap();
        assert_eq!(v.resolve_source(Path::new("/work/proj")), "/work/proj/app");
    }

    #[test]
    fn shell_strings_split_for_containers() {
        let line = CommandLine::Shell("composer install --no-dev".to_string());
        assert_eq!(line.to_args(), vec!["composer", "install", "--no-dev"]);
        assert_eq!(line.to_host_args()[..2], ["sh", "-c"]);
    }

    #[test]
    fn command_needs_exactly_one_kind() {
        let both = "image: alpine\nexec: ls\n";
        assert!(serde_yaml::from_str::<Command>(both).is_err());
        let none = "description: nothing\n";
        assert!(serde_yaml::from_str::<Command>(none).is_err());
    }

    #[test]
    fn host_command_rejects_container_fields() {
        let yaml = "exec: make\nvolumes: ['./a:/a']\n";
        let err = serde_yaml::from_str::<Command>(yaml).unwrap_err();
        assert!(err.to_string().contains("volumes"));
    }
}

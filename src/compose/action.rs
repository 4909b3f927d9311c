// ABOUTME: The compose subcommands radi drives and their flags.
// ABOUTME: args() is deterministic so it can be asserted on directly.

use crate::operation::whole_seconds;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComposeAction {
    Up {
        detach: bool,
        build: bool,
        remove_orphans: bool,
        services: Vec<String>,
    },
    Down {
        volumes: bool,
        remove_orphans: bool,
    },
    Start {
        services: Vec<String>,
    },
    Stop {
        timeout: Option<Duration>,
        services: Vec<String>,
    },
    Restart {
        timeout: Option<Duration>,
        services: Vec<String>,
    },
    Pull {
        services: Vec<String>,
    },
    Build {
        no_cache: bool,
        services: Vec<String>,
    },
    Ps,
    Logs {
        follow: bool,
        tail: Option<u64>,
        services: Vec<String>,
    },
    Config,
}

impl ComposeAction {
    pub fn name(&self) -> &'static str {
        match self {
            ComposeAction::Up { .. } => "up",
            ComposeAction::Down { .. } => "down",
            ComposeAction::Start { .. } => "start",
            ComposeAction::Stop { .. } => "stop",
            ComposeAction::Restart { .. } => "restart",
            ComposeAction::Pull { .. } => "pull",
            ComposeAction::Build { .. } => "build",
            ComposeAction::Ps => "ps",
            ComposeAction::Logs { .. } => "logs",
            ComposeAction::Config => "config",
        }
    }

    pub fn args(&self) -> Vec<String> {
        let mut args = vec![self.name().to_string()];

        let services: &[String] = match self {
            ComposeAction::Up {
                detach,
                build,
                remove_orphans,
                services,
            } => {
                flag(&mut args, *detach, "--detach");
                flag(&mut args, *build, "--build");
                flag(&mut args, *remove_orphans, "--remove-orphans");
                services
            }
            ComposeAction::Down {
                volumes,
                remove_orphans,
            } => {
                flag(&mut args, *volumes, "--volumes");
                flag(&mut args, *remove_orphans, "--remove-orphans");
                &[]
            }
            ComposeAction::Build { no_cache, services } => {
                flag(&mut args, *no_cache, "--no-cache");
                services
            }
            ComposeAction::Stop { timeout, services }
            | ComposeAction::Restart { timeout, services } => {
                if let Some(timeout) = timeout {
                    args.push("--timeout".to_string());
                    args.push(whole_seconds(*timeout).to_string());
                }
                services
            }
            ComposeAction::Logs {
                follow,
                tail,
                services,
            } => {
                flag(&mut args, *follow, "--follow");
                if let Some(tail) = tail {
                    args.push("--tail".to_string());
                    args.push(tail.to_string());
                }
                services
            }
            ComposeAction::Start { services } | ComposeAction::Pull { services } => services,
            ComposeAction::Ps | ComposeAction::Config => &[],
        };

        args.extend(services.iter().cloned());
        args
    }

    /// Whether the output is data for the caller rather than progress for the user.
    pub fn captures_output(&self) -> bool {
        matches!(self, ComposeAction::Ps | ComposeAction::Config)
    }
}

fn flag(args: &mut Vec<String>, set: bool, name: &str) {
    if set {
        args.push(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn up_flags_precede_services() {
        let action = ComposeAction::Up {
            detach: true,
            build: false,
            remove_orphans: true,
            services: vec!["web".to_string()],
        };
        assert_eq!(action.args(), ["up", "--detach", "--remove-orphans", "web"]);
    }

    #[test]
    fn stop_timeout_in_seconds() {
        let action = ComposeAction::Stop {
            timeout: Some(Duration::from_secs(30)),
            services: vec![],
        };
        assert_eq!(action.args(), ["stop", "--timeout", "30"]);
    }

    #[test]
    fn sub_second_timeout_rounds_up() {
        let action = ComposeAction::Restart {
            timeout: Some(Duration::from_millis(500)),
            services: vec![],
        };
        assert_eq!(action.args(), ["restart", "--timeout", "1"]);
    }
}

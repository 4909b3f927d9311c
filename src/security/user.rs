// ABOUTME: Identity of the user running radi, from the environment and hostname.
// ABOUTME: RADI_USER overrides the login name.

use serde::Serialize;

const USER_VARS: &[&str] = &["RADI_USER", "USER", "USERNAME"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
    pub id: String,
    pub host: String,
}

impl CurrentUser {
    pub fn new(id: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            host: host.into(),
        }
    }

    pub fn detect() -> Self {
        let id = USER_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "unknown".to_string());
        let host = gethostname::gethostname().to_string_lossy().into_owned();
        Self { id, host }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radi_user_overrides_login() {
        temp_env::with_vars(
            [("RADI_USER", Some("deployer")), ("USER", Some("ann"))],
            || assert_eq!(CurrentUser::detect().id, "deployer"),
        );
    }

    #[test]
    fn falls_back_to_user() {
        temp_env::with_vars(
            [("RADI_USER", None::<&str>), ("USER", Some("ann"))],
            || assert_eq!(CurrentUser::detect().id, "ann"),
        );
    }
}

// ABOUTME: Loads authorization rules from authorize.yml across config scopes.
// ABOUTME: Rules concatenate in scope order; the most specific `default` wins.

use super::{ConfigError, ConfigWrapper};
use crate::security::{AuthorizeFile, RuleSet};

pub const AUTHORIZE_KEY: &str = "authorize";

#[derive(Debug, Clone)]
pub struct AuthorizeWrapper {
    config: ConfigWrapper,
}

impl AuthorizeWrapper {
    pub fn new(config: ConfigWrapper) -> Self {
        Self { config }
    }

    pub fn load(&self) -> Result<RuleSet, ConfigError> {
        let mut default = None;
        let mut rules = Vec::new();

        for (scope, file) in self.config.decode::<AuthorizeFile>(AUTHORIZE_KEY)? {
            tracing::debug!(scope = %scope, rules = file.rules.len(), "loaded authorization rules");
            if file.default.is_some() {
                default = file.default;
            }
            rules.extend(file.rules);
        }

        RuleSet::compile(default.unwrap_or_default(), rules)
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

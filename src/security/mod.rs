// ABOUTME: Operation authorization: ordered allow/deny rules matched by operation id and user.
// ABOUTME: AuthorizedOperation gates exec on the resolved decision.

mod user;

pub use user::CurrentUser;

use crate::operation::{Operation, OperationError, Properties};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("rule {rule}: invalid operation pattern: {error}")]
    InvalidPattern { rule: String, error: regex::Error },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    #[default]
    Allow,
    Deny,
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Allow => f.write_str("allow"),
            Effect::Deny => f.write_str("deny"),
        }
    }
}

/// A rule as written in `authorize.yml`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    pub id: String,
    /// Regular expression matched against the operation id.
    pub operation: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<String>,
    pub effect: Effect,
}

/// Contents of one scope's `authorize.yml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthorizeFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Effect>,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

#[derive(Debug, Clone)]
struct Rule {
    id: String,
    pattern: Regex,
    users: Vec<String>,
    effect: Effect,
}

impl Rule {
    fn applies(&self, operation: &str, user: &str) -> bool {
        self.pattern.is_match(operation)
            && (self.users.is_empty() || self.users.iter().any(|u| u == user))
    }
}

/// Outcome of evaluating the rules for one operation and user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Deny,
    /// No rule applied.
    Neutral,
}

impl Decision {
    pub fn resolve(self, default: Effect) -> Effect {
        match self {
            Decision::Allow => Effect::Allow,
            Decision::Deny => Effect::Deny,
            Decision::Neutral => default,
        }
    }
}

impl From<Effect> for Decision {
    fn from(effect: Effect) -> Self {
        match effect {
            Effect::Allow => Decision::Allow,
            Effect::Deny => Decision::Deny,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Allow => f.write_str("allow"),
            Decision::Deny => f.write_str("deny"),
            Decision::Neutral => f.write_str("neutral"),
        }
    }
}

/// Compiled rules in declaration order.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    default: Effect,
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn compile(default: Effect, specs: Vec<RuleSpec>) -> Result<Self, SecurityError> {
        let rules = specs
            .into_iter()
            .map(|spec| {
                let pattern =
                    Regex::new(&spec.operation).map_err(|error| SecurityError::InvalidPattern {
                        rule: spec.id.clone(),
                        error,
                    })?;
                Ok(Rule {
                    id: spec.id,
                    pattern,
                    users: spec.users,
                    effect: spec.effect,
                })
            })
            .collect::<Result<Vec<_>, SecurityError>>()?;

        Ok(Self { default, rules })
    }

    pub fn default_effect(&self) -> Effect {
        self.default
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The last applying rule wins.
    pub fn authorize(&self, operation: &str, user: &str) -> Decision {
        match self
            .rules
            .iter()
            .rev()
            .find(|rule| rule.applies(operation, user))
        {
            Some(rule) => {
                tracing::debug!(rule = %rule.id, operation, user, effect = %rule.effect, "rule applied");
                rule.effect.into()
            }
            None => Decision::Neutral,
        }
    }

    pub fn check(&self, operation: &str, user: &str) -> Authorization {
        let decision = self.authorize(operation, user);
        Authorization {
            operation: operation.to_string(),
            user: user.to_string(),
            decision,
            allowed: decision.resolve(self.default) == Effect::Allow,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Authorization {
    pub operation: String,
    pub user: String,
    pub decision: Decision,
    pub allowed: bool,
}

/// Decides whether the current user may run an operation.
pub trait Authorizer: Send + Sync {
    fn user(&self) -> &CurrentUser;

    fn check(&self, operation: &str, user: &str) -> Authorization;

    fn authorize(&self, operation: &str) -> Authorization {
        self.check(operation, &self.user().id)
    }
}

/// Authorizer over a rule set loaded from config.
#[derive(Debug, Clone)]
pub struct RuleAuthorizer {
    rules: RuleSet,
    user: CurrentUser,
}

impl RuleAuthorizer {
    pub fn new(rules: RuleSet, user: CurrentUser) -> Self {
        Self { rules, user }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }
}

impl Authorizer for RuleAuthorizer {
    fn user(&self) -> &CurrentUser {
        &self.user
    }

    fn check(&self, operation: &str, user: &str) -> Authorization {
        self.rules.check(operation, user)
    }
}

/// Wraps an operation so `exec` only runs when the authorizer allows it.
pub struct AuthorizedOperation {
    inner: Box<dyn Operation>,
    authorizer: Arc<dyn Authorizer>,
}

impl AuthorizedOperation {
    pub fn new(inner: Box<dyn Operation>, authorizer: Arc<dyn Authorizer>) -> Self {
        Self { inner, authorizer }
    }

    pub fn into_inner(self) -> Box<dyn Operation> {
        self.inner
    }
}

#[async_trait]
impl Operation for AuthorizedOperation {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn label(&self) -> &str {
        self.inner.label()
    }

    fn description(&self) -> &str {
        self.inner.description()
    }

    fn help(&self) -> &str {
        self.inner.help()
    }

    fn internal(&self) -> bool {
        self.inner.internal()
    }

    fn properties(&self) -> &Properties {
        self.inner.properties()
    }

    fn properties_mut(&mut self) -> &mut Properties {
        self.inner.properties_mut()
    }

    fn validate(&self) -> Result<(), OperationError> {
        self.inner.validate()
    }

    async fn exec(&mut self) -> Result<(), OperationError> {
        let authorization = self.authorizer.authorize(self.inner.id());
        if !authorization.allowed {
            tracing::warn!(
                operation = %authorization.operation,
                user = %authorization.user,
                decision = %authorization.decision,
                "operation denied"
            );
            return Err(OperationError::Unauthorized {
                operation: authorization.operation,
                user: authorization.user,
            });
        }
        self.inner.exec().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: &str, operation: &str, users: &[&str], effect: Effect) -> RuleSpec {
        RuleSpec {
            id: id.to_string(),
            operation: operation.to_string(),
            users: users.iter().map(|u| u.to_string()).collect(),
            effect,
        }
    }

    #[test]
    fn no_rules_is_neutral() {
        let rules = RuleSet::compile(Effect::Allow, vec![]).unwrap();
        assert_eq!(rules.authorize("config.get", "ann"), Decision::Neutral);
        assert!(rules.check("config.get", "ann").allowed);
    }

    #[test]
    fn last_applying_rule_wins() {
        let rules = RuleSet::compile(
            Effect::Allow,
            vec![
                rule("deny-all", ".*", &[], Effect::Deny),
                rule("ops-orchestrate", "^orchestrate\\.", &["ops"], Effect::Allow),
            ],
        )
        .unwrap();

        assert_eq!(rules.authorize("orchestrate.up", "ops"), Decision::Allow);
        assert_eq!(rules.authorize("orchestrate.up", "dev"), Decision::Deny);
        assert_eq!(rules.authorize("config.get", "ops"), Decision::Deny);
    }

    #[test]
    fn neutral_uses_default() {
        let rules = RuleSet::compile(Effect::Deny, vec![]).unwrap();
        assert!(!rules.check("monitor.ps", "ann").allowed);
        assert_eq!(Decision::Neutral.resolve(Effect::Deny), Effect::Deny);
        assert_eq!(Decision::Allow.resolve(Effect::Deny), Effect::Allow);
    }

    #[test]
    fn invalid_pattern_names_the_rule() {
        let err = RuleSet::compile(Effect::Allow, vec![rule("broken", "(", &[], Effect::Deny)])
            .unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn authorize_file_parses() {
        let yaml = r#"
default: deny
rules:
  - id: read
    operation: "^(config|setting)\\.(list|get)$"
    effect: allow
"#;
        let file: AuthorizeFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.default, Some(Effect::Deny));
        assert_eq!(file.rules.len(), 1);
        assert!(file.rules[0].users.is_empty());
    }
}

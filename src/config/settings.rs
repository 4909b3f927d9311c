// ABOUTME: Settings wrapper: flat key/value YAML merged across config scopes.
// ABOUTME: Reads merge with the most specific scope winning; writes touch one scope.

use super::{ConfigError, ConfigWrapper};
use indexmap::IndexMap;
use serde_yaml::Value;

pub const SETTINGS_KEY: &str = "settings";

type SettingsMap = IndexMap<String, Value>;

#[derive(Debug, Clone)]
pub struct SettingsWrapper {
    config: ConfigWrapper,
}

impl SettingsWrapper {
    pub fn new(config: ConfigWrapper) -> Self {
        Self { config }
    }

    /// All settings, most specific scope winning. Key order is first-seen.
    pub fn merged(&self) -> Result<SettingsMap, ConfigError> {
        let mut merged = SettingsMap::new();
        for (_, scope_values) in self.config.decode::<SettingsMap>(SETTINGS_KEY)? {
            for (key, value) in scope_values {
                merged.insert(key, value);
            }
        }
        Ok(merged)
    }

    pub fn list(&self) -> Result<Vec<String>, ConfigError> {
        Ok(self.merged()?.into_keys().collect())
    }

    pub fn get(&self, key: &str) -> Result<Option<Value>, ConfigError> {
        Ok(self.merged()?.shift_remove(key))
    }

    /// The value of `key` in every scope that defines it.
    pub fn get_scoped(&self, key: &str) -> Result<IndexMap<String, Value>, ConfigError> {
        Ok(self
            .config
            .decode::<SettingsMap>(SETTINGS_KEY)?
            .into_iter()
            .filter_map(|(scope, mut values)| values.shift_remove(key).map(|v| (scope, v)))
            .collect())
    }

    /// Set `key` in `scope`, leaving other keys of that scope untouched.
    pub fn set(&self, key: &str, value: Value, scope: &str) -> Result<(), ConfigError> {
        if !self.config.scopes().iter().any(|s| s == scope) {
            return Err(ConfigError::UnknownScope {
                key: SETTINGS_KEY.to_string(),
                scope: scope.to_string(),
            });
        }

        let mut values = self
            .config
            .decode_scope::<SettingsMap>(SETTINGS_KEY, scope)?
            .unwrap_or_default();
        values.insert(key.to_string(), value);

        tracing::debug!(key, scope, "updating setting");
        self.config.encode(SETTINGS_KEY, scope, &values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryConnector;
    use std::sync::Arc;

    fn wrapper() -> SettingsWrapper {
        let connector = MemoryConnector::new(["user", "project"])
            .with_value("user", SETTINGS_KEY, "editor: vim\ntheme: dark\n")
            .with_value("project", SETTINGS_KEY, "theme: light\nport: 8080\n");
        SettingsWrapper::new(ConfigWrapper::new(Arc::new(connector)))
    }

    #[test]
    fn project_scope_overrides_user_scope() {
        let settings = wrapper();
        assert_eq!(
            settings.get("theme").unwrap(),
            Some(Value::String("light".to_string()))
        );
        assert_eq!(settings.list().unwrap(), vec!["editor", "theme", "port"]);
    }

    #[test]
    fn scoped_values_keep_scope_order() {
        let scoped = wrapper().get_scoped("theme").unwrap();
        let scopes: Vec<&str> = scoped.keys().map(String::as_str).collect();
        assert_eq!(scopes, vec!["user", "project"]);
    }

    #[test]
    fn set_only_touches_one_scope() {
        let settings = wrapper();
        settings
            .set("editor", Value::String("nano".to_string()), "project")
            .unwrap();

        let scoped = settings.get_scoped("editor").unwrap();
        assert_eq!(scoped["user"], Value::String("vim".to_string()));
        assert_eq!(scoped["project"], Value::String("nano".to_string()));
        assert_eq!(
            settings.get("port").unwrap(),
            Some(Value::Number(8080.into()))
        );
    }

    #[test]
    fn set_ignores_broken_yaml_in_other_scopes() {
        let connector = MemoryConnector::new(["user", "project"])
            .with_value("user", SETTINGS_KEY, "editor: [unclosed\n");
        let settings = SettingsWrapper::new(ConfigWrapper::new(Arc::new(connector)));

        settings
            .set("editor", Value::String("nano".to_string()), "project")
            .unwrap();

        let err = settings.get("editor").unwrap_err();
        assert!(err.to_string().contains("user scope"));
    }

    #[test]
    fn set_in_unknown_scope_fails() {
        let err = wrapper()
            .set("x", Value::Bool(true), "global")
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownScope { .. }));
    }
}

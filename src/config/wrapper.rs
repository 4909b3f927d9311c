// ABOUTME: ConfigWrapper: typed access to a config connector.
// ABOUTME: Decodes and encodes per-scope YAML for the settings, commands and rules wrappers.

use super::{ConfigConnector, ConfigError, ScopedValues};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

#[derive(Clone)]
pub struct ConfigWrapper {
    connector: Arc<dyn ConfigConnector>,
}

impl ConfigWrapper {
    pub fn new(connector: Arc<dyn ConfigConnector>) -> Self {
        Self { connector }
    }

    pub fn scopes(&self) -> Vec<String> {
        self.connector.scopes()
    }

    pub fn list(&self) -> Result<Vec<String>, ConfigError> {
        self.connector.list()
    }

    pub fn get(&self, key: &str) -> Result<ScopedValues, ConfigError> {
        self.connector.readers(key)
    }

    pub fn set(&self, key: &str, values: &ScopedValues) -> Result<(), ConfigError> {
        self.connector.write(key, values)
    }

    /// Decode `key` from every scope that has non-blank content.
    pub fn decode<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<(String, T)>, ConfigError> {
        let mut decoded = Vec::new();
        for (scope, data) in self.get(key)? {
            if let Some(value) = decode_bytes(key, &scope, &data)? {
                decoded.push((scope, value));
            }
        }
        Ok(decoded)
    }

    /// Decode `key` from one scope only. Other scopes are never parsed.
    pub fn decode_scope<T: DeserializeOwned>(
        &self,
        key: &str,
        scope: &str,
    ) -> Result<Option<T>, ConfigError> {
        match self.get(key)?.get(scope) {
            Some(data) => decode_bytes(key, scope, data),
            None => Ok(None),
        }
    }

    /// Replace `key` in a single scope with the YAML encoding of `value`.
    pub fn encode<T: Serialize>(&self, key: &str, scope: &str, value: &T) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(value)
            .map_err(|e| ConfigError::yaml(format!("{key} ({scope} scope)"), e))?;
        let mut values = ScopedValues::new();
        values.insert(scope, yaml.into_bytes());
        self.set(key, &values)
    }
}

fn decode_bytes<T: DeserializeOwned>(
    key: &str,
    scope: &str,
    data: &[u8],
) -> Result<Option<T>, ConfigError> {
    if data.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_yaml::from_slice(data)
        .map(Some)
        .map_err(|e| ConfigError::yaml(format!("{key} ({scope} scope)"), e))
}

impl std::fmt::Debug for ConfigWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigWrapper")
            .field("scopes", &self.connector.scopes())
            .finish()
    }
}

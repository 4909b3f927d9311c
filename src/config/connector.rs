// ABOUTME: Config connectors map (scope, key) pairs onto byte sources.
// ABOUTME: DirectoryConnector reads <dir>/<key>.yml per scope; MemoryConnector backs tests.

use super::{ConfigError, ScopedValues};
use crate::bytesource::{ByteSource, FileByteSource, MemoryByteSource};
use indexmap::{IndexMap, IndexSet};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};

const EXTENSION: &str = "yml";

/// Source of scoped config values.
///
/// Scopes are ordered from most general to most specific; readers return
/// values in that order so callers can merge with "last scope wins".
pub trait ConfigConnector: Send + Sync {
    fn scopes(&self) -> Vec<String>;

    /// Keys present in any scope, in first-seen order.
    fn list(&self) -> Result<Vec<String>, ConfigError>;

    /// Values for `key` from every scope that has it.
    fn readers(&self, key: &str) -> Result<ScopedValues, ConfigError>;

    /// Replace the value of `key` in each scope present in `values`.
    fn write(&self, key: &str, values: &ScopedValues) -> Result<(), ConfigError>;
}

fn validate_key(key: &str) -> Result<(), ConfigError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidKey(key.to_string()))
    }
}

/// One directory per scope, one `<key>.yml` file per key.
#[derive(Debug, Clone, Default)]
pub struct DirectoryConnector {
    scopes: IndexMap<String, PathBuf>,
}

impl DirectoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a scope. Later scopes take precedence over earlier ones.
    pub fn with_scope(mut self, scope: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        self.scopes.insert(scope.into(), dir.into());
        self
    }

    pub fn scope_dir(&self, scope: &str) -> Option<&Path> {
        self.scopes.get(scope).map(PathBuf::as_path)
    }

    fn source(&self, dir: &Path, key: &str) -> FileByteSource {
        FileByteSource::new(dir.join(format!("{key}.{EXTENSION}")))
    }
}

impl ConfigConnector for DirectoryConnector {
    fn scopes(&self) -> Vec<String> {
        self.scopes.keys().cloned().collect()
    }

    fn list(&self) -> Result<Vec<String>, ConfigError> {
        let mut keys = IndexSet::new();

        for dir in self.scopes.values() {
            let entries = match std::fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            let mut found: Vec<String> = entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.is_file())
                .filter(|path| path.extension().is_some_and(|ext| ext == EXTENSION))
                .filter_map(|path| {
                    path.file_stem()
                        .and_then(|stem| stem.to_str())
                        .map(str::to_string)
                })
                .collect();
            // read_dir order is platform dependent
            found.sort();
            keys.extend(found);
        }

        Ok(keys.into_iter().collect())
    }

    fn readers(&self, key: &str) -> Result<ScopedValues, ConfigError> {
        validate_key(key)?;
        let mut values = ScopedValues::new();
        for (scope, dir) in &self.scopes {
            let source = self.source(dir, key);
            if source.exists() {
                tracing::debug!(key, scope = %scope, path = %source.describe(), "reading config");
                values.insert(scope.clone(), source.read()?);
            }
        }
        Ok(values)
    }

    fn write(&self, key: &str, values: &ScopedValues) -> Result<(), ConfigError> {
        validate_key(key)?;
        for (scope, data) in values.iter() {
            let dir = self
                .scopes
                .get(scope)
                .ok_or_else(|| ConfigError::UnknownScope {
                    key: key.to_string(),
                    scope: scope.to_string(),
                })?;
            self.source(dir, key).write(data)?;
        }
        Ok(())
    }
}

/// Scoped in-memory config. Used by tests and by handlers without a filesystem.
#[derive(Debug, Default)]
pub struct MemoryConnector {
    scopes: Vec<String>,
    sources: RwLock<IndexMap<(String, String), MemoryByteSource>>,
}

impl MemoryConnector {
    pub fn new<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scopes: scopes.into_iter().map(Into::into).collect(),
            sources: RwLock::default(),
        }
    }

    /// Seed a value. Unknown scopes are ignored.
    pub fn with_value(self, scope: &str, key: &str, value: &str) -> Self {
        if self.scopes.iter().any(|s| s == scope) {
            self.sources.write().insert(
                (scope.to_string(), key.to_string()),
                MemoryByteSource::with_contents(format!("{scope}/{key}"), value.to_string()),
            );
        }
        self
    }
}

impl ConfigConnector for MemoryConnector {
    fn scopes(&self) -> Vec<String> {
        self.scopes.clone()
    }

    fn list(&self) -> Result<Vec<String>, ConfigError> {
        let sources = self.sources.read();
        let mut keys = IndexSet::new();
        for scope in &self.scopes {
            let mut found: Vec<&String> = sources
                .keys()
                .filter(|(s, _)| s == scope)
                .map(|(_, k)| k)
                .collect();
            found.sort();
            keys.extend(found.into_iter().cloned());
        }
        Ok(keys.into_iter().collect())
    }

    fn readers(&self, key: &str) -> Result<ScopedValues, ConfigError> {
        validate_key(key)?;
        let sources = self.sources.read();
        let mut values = ScopedValues::new();
        for scope in &self.scopes {
            if let Some(source) = sources.get(&(scope.clone(), key.to_string())) {
                values.insert(scope.clone(), source.read()?);
            }
        }
        Ok(values)
    }

    fn write(&self, key: &str, values: &ScopedValues) -> Result<(), ConfigError> {
        validate_key(key)?;
        let mut sources = self.sources.write();
        for (scope, data) in values.iter() {
            if !self.scopes.iter().any(|s| s == scope) {
                return Err(ConfigError::UnknownScope {
                    key: key.to_string(),
                    scope: scope.to_string(),
                });
            }
            sources
                .entry((scope.to_string(), key.to_string()))
                .or_insert_with(|| MemoryByteSource::new(format!("{scope}/{key}")))
                .write(data)?;
        }
        Ok(())
    }
}

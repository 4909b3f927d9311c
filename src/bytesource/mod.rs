// ABOUTME: Byte sources: a single readable/writable blob, backed by a file or memory.
// ABOUTME: Config connectors build scoped config on top of these.

use bytes::Bytes;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ByteSourceError {
    #[error("failed to read {source_name}: {error}")]
    Read {
        source_name: String,
        error: std::io::Error,
    },

    #[error("failed to write {source_name}: {error}")]
    Write {
        source_name: String,
        error: std::io::Error,
    },

    #[error("{0} is read-only")]
    ReadOnly(String),
}

/// A blob of bytes that can be read and replaced as a whole.
pub trait ByteSource: Send + Sync {
    /// Human readable location, used in errors and logs.
    fn describe(&self) -> String;

    fn exists(&self) -> bool;

    /// Read the full contents. A missing source reads as empty.
    fn read(&self) -> Result<Bytes, ByteSourceError>;

    fn write(&self, data: &[u8]) -> Result<(), ByteSourceError>;
}

/// File on disk. Parent directories are created on first write.
#[derive(Debug, Clone)]
pub struct FileByteSource {
    path: PathBuf,
    read_only: bool,
}

impl FileByteSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            read_only: false,
        }
    }

    pub fn read_only(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            read_only: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteSource for FileByteSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn read(&self) -> Result<Bytes, ByteSourceError> {
        match std::fs::read(&self.path) {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Bytes::new()),
            Err(error) => Err(ByteSourceError::Read {
                source_name: self.describe(),
                error,
            }),
        }
    }

    fn write(&self, data: &[u8]) -> Result<(), ByteSourceError> {
        if self.read_only {
            return Err(ByteSourceError::ReadOnly(self.describe()));
        }

        let wrap = |error| ByteSourceError::Write {
            source_name: self.describe(),
            error,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(wrap)?;
        }
        tracing::debug!(path = %self.path.display(), bytes = data.len(), "writing file");
        std::fs::write(&self.path, data).map_err(wrap)
    }
}

/// Shared in-memory buffer. Clones see each other's writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryByteSource {
    name: String,
    data: Arc<RwLock<Option<Bytes>>>,
}

impl MemoryByteSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: Arc::default(),
        }
    }

    pub fn with_contents(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let source = Self::new(name);
        *source.data.write() = Some(data.into());
        source
    }
}

impl ByteSource for MemoryByteSource {
    fn describe(&self) -> String {
        format!("memory:{}", self.name)
    }

    fn exists(&self) -> bool {
        self.data.read().is_some()
    }

    fn read(&self) -> Result<Bytes, ByteSourceError> {
        Ok(self.data.read().clone().unwrap_or_default())
    }

    fn write(&self, data: &[u8]) -> Result<(), ByteSourceError> {
        *self.data.write() = Some(Bytes::copy_from_slice(data));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileByteSource::new(dir.path().join("nope.yml"));
        assert!(!source.exists());
        assert!(source.read().unwrap().is_empty());
    }

    #[test]
    fn file_write_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileByteSource::new(dir.path().join("a/b/settings.yml"));
        source.write(b"key: value\n").unwrap();
        assert!(source.exists());
        assert_eq!(&source.read().unwrap()[..], b"key: value\n");
    }

    #[test]
    fn read_only_file_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileByteSource::read_only(dir.path().join("x.yml"));
        assert!(matches!(
            source.write(b"x"),
            Err(ByteSourceError::ReadOnly(_))
        ));
    }

    #[test]
    fn memory_clones_share_contents() {
        let source = MemoryByteSource::new("settings");
        let clone = source.clone();
        assert!(!clone.exists());
        source.write(b"a: 1").unwrap();
        assert!(clone.exists());
        assert_eq!(&clone.read().unwrap()[..], b"a: 1");
    }
}

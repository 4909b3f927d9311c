// ABOUTME: Dot-separated operation identifiers such as `orchestrate.up`.
// ABOUTME: The first segment names the implementation the operation belongs to.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OperationIdError {
    #[error("operation id cannot be empty")]
    Empty,

    #[error("operation id has an empty segment: {0}")]
    EmptySegment(String),

    #[error("invalid character in operation id: '{0}'")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperationId(String);

impl OperationId {
    pub fn new(value: &str) -> Result<Self, OperationIdError> {
        if value.is_empty() {
            return Err(OperationIdError::Empty);
        }

        for segment in value.split('.') {
            if segment.is_empty() {
                return Err(OperationIdError::EmptySegment(value.to_string()));
            }
            if let Some(c) = segment
                .chars()
                .find(|c| !c.is_ascii_alphanumeric() && *c != '-' && *c != '_')
            {
                return Err(OperationIdError::InvalidChar(c));
            }
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The leading segment, e.g. `orchestrate` for `orchestrate.up`.
    pub fn implementation(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for OperationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_implementation() {
        let id = OperationId::new("provision.server.create").unwrap();
        assert_eq!(id.implementation(), "provision");
    }

    #[test]
    fn rejects_bad_segments() {
        assert_eq!(
            OperationId::new("config..get").unwrap_err(),
            OperationIdError::EmptySegment("config..get".to_string())
        );
        assert_eq!(
            OperationId::new("config get").unwrap_err(),
            OperationIdError::InvalidChar(' ')
        );
    }
}

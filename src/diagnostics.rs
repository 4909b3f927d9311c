// ABOUTME: Diagnostics accumulator for non-fatal warnings while building a project.
// ABOUTME: Collects warnings that shouldn't fail activation but should be shown to users.

/// Collects non-fatal warnings during builder activation.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// A non-fatal warning collected during activation.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// A builder was asked for an implementation it does not provide.
    pub fn unsupported_implementation(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::UnsupportedImplementation,
            message: message.into(),
        }
    }

    /// A builder entry activates nothing.
    pub fn no_implementations(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::NoImplementations,
            message: message.into(),
        }
    }

    /// A file a builder refers to does not exist yet.
    pub fn missing_source(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::MissingSource,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    UnsupportedImplementation,
    NoImplementations,
    /// Compose file or config directory missing.
    MissingSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_starts_empty() {
        let diag = Diagnostics::default();
        assert!(!diag.has_warnings());
        assert!(diag.warnings().is_empty());
    }

    #[test]
    fn diagnostics_collects_warnings() {
        let mut diag = Diagnostics::default();

        diag.warn(Warning::unsupported_implementation("null has no foo"));
        diag.warn(Warning::missing_source("docker-compose.yml not found"));

        assert!(diag.has_warnings());
        assert_eq!(diag.warnings().len(), 2);
        assert_eq!(diag.warnings()[1].kind, WarningKind::MissingSource);
    }
}

// ABOUTME: The Operation abstraction: id, label, description, properties, validate, exec.
// ABOUTME: Also the ordered Operations collection and the validate-then-exec runner.

mod error;
mod property;

pub use error::OperationError;
pub use property::{
    Properties, Property, PropertyError, PropertyKind, PropertyValue, Usage, whole_seconds,
};

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Static description shared by every instance of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationMeta {
    pub id: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub help: &'static str,
    pub internal: bool,
}

impl OperationMeta {
    pub const fn new(id: &'static str, label: &'static str, description: &'static str) -> Self {
        Self {
            id,
            label,
            description,
            help: "",
            internal: false,
        }
    }

    pub const fn with_help(mut self, help: &'static str) -> Self {
        self.help = help;
        self
    }

    pub const fn internal(mut self) -> Self {
        self.internal = true;
        self
    }
}

/// A unit of work a handler exposes.
#[async_trait]
pub trait Operation: Send + Sync {
    fn id(&self) -> &str;

    fn label(&self) -> &str;

    fn description(&self) -> &str;

    fn help(&self) -> &str {
        ""
    }

    /// Internal operations are callable but hidden from listings.
    fn internal(&self) -> bool {
        false
    }

    fn properties(&self) -> &Properties;

    fn properties_mut(&mut self) -> &mut Properties;

    /// Check inputs before `exec`. The default requires every required property.
    fn validate(&self) -> Result<(), OperationError> {
        let missing = self.properties().missing_required();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(OperationError::MissingProperties(missing))
        }
    }

    async fn exec(&mut self) -> Result<(), OperationError>;
}

/// Implements the metadata half of [`Operation`] for a struct with
/// `meta: OperationMeta` and `properties: Properties` fields.
macro_rules! operation_meta {
    () => {
        fn id(&self) -> &str {
            self.meta.id
        }

        fn label(&self) -> &str {
            self.meta.label
        }

        fn description(&self) -> &str {
            self.meta.description
        }

        fn help(&self) -> &str {
            self.meta.help
        }

        fn internal(&self) -> bool {
            self.meta.internal
        }

        fn properties(&self) -> &$crate::operation::Properties {
            &self.properties
        }

        fn properties_mut(&mut self) -> &mut $crate::operation::Properties {
            &mut self.properties
        }
    };
}

pub(crate) use operation_meta;

/// Outcome of running one operation.
#[derive(Debug, Clone, Serialize)]
pub struct OperationResult {
    pub operation: String,
    pub success: bool,
    pub errors: Vec<String>,
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
}

impl OperationResult {
    pub fn is_success(&self) -> bool {
        self.success
    }
}

/// Validate, then execute. Errors are captured in the result.
pub async fn run(operation: &mut dyn Operation) -> OperationResult {
    let started = Instant::now();
    let id = operation.id().to_string();
    tracing::info!(operation = %id, "running operation");

    let outcome = match operation.validate() {
        Ok(()) => operation.exec().await,
        Err(e) => Err(e),
    };

    let duration = started.elapsed();
    match outcome {
        Ok(()) => {
            tracing::info!(operation = %id, ?duration, "operation finished");
            OperationResult {
                operation: id,
                success: true,
                errors: Vec::new(),
                duration,
            }
        }
        Err(e) => {
            tracing::warn!(operation = %id, error = %e, "operation failed");
            OperationResult {
                operation: id,
                success: false,
                errors: vec![e.to_string()],
                duration,
            }
        }
    }
}

/// Operations keyed by id, in registration order.
#[derive(Default)]
pub struct Operations(IndexMap<String, Box<dyn Operation>>);

impl Operations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an operation. An existing operation with the same id is replaced in place.
    pub fn add(&mut self, operation: Box<dyn Operation>) {
        debug_assert!(
            crate::types::OperationId::new(operation.id()).is_ok(),
            "invalid operation id {}",
            operation.id()
        );
        let id = operation.id().to_string();
        if self.0.insert(id.clone(), operation).is_some() {
            tracing::debug!(operation = %id, "operation overridden");
        }
    }

    pub fn with(mut self, operation: impl Operation + 'static) -> Self {
        self.add(Box::new(operation));
        self
    }

    /// Add every operation of `other`, later ones winning.
    pub fn merge(&mut self, other: Operations) {
        for (_, operation) in other.0 {
            self.add(operation);
        }
    }

    pub fn get(&self, id: &str) -> Option<&dyn Operation> {
        self.0.get(id).map(|op| op.as_ref())
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Box<dyn Operation>> {
        self.0.get_mut(id)
    }

    pub fn remove(&mut self, id: &str) -> Option<Box<dyn Operation>> {
        self.0.shift_remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Operation> {
        self.0.values().map(|op| op.as_ref())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Replace every operation by `f(operation)`, keeping order.
    pub fn map(self, mut f: impl FnMut(Box<dyn Operation>) -> Box<dyn Operation>) -> Self {
        Self(self.0.into_iter().map(|(id, op)| (id, f(op))).collect())
    }
}

impl std::fmt::Debug for Operations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.0.keys()).finish()
    }
}

impl IntoIterator for Operations {
    type Item = Box<dyn Operation>;
    type IntoIter = indexmap::map::IntoValues<String, Box<dyn Operation>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_values()
    }
}

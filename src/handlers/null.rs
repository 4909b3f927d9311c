// ABOUTME: The null handler registers standard operation ids that do nothing.
// ABOUTME: Listing it after another builder disables that builder's operations.

use crate::diagnostics::Diagnostics;
use crate::handler::{
    BuildError, Builder, BuilderSettings, Handler, HandlerSet, Implementation,
    supported_implementations,
};
use crate::operation::{Operation, OperationError, Operations, Properties};
use async_trait::async_trait;

pub const BUILDER_ID: &str = "null";

/// Validates and executes successfully without side effects.
pub struct NullOperation {
    id: String,
    label: String,
    properties: Properties,
}

impl NullOperation {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: format!("{id} (disabled)"),
            id,
            properties: Properties::new(),
        }
    }
}

#[async_trait]
impl Operation for NullOperation {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn description(&self) -> &str {
        "Does nothing; provided by the null builder."
    }

    fn properties(&self) -> &Properties {
        &self.properties
    }

    fn properties_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }

    async fn exec(&mut self) -> Result<(), OperationError> {
        tracing::debug!(operation = %self.id, "null operation");
        Ok(())
    }
}

/// Null operations for one implementation.
pub struct NullHandler(Implementation);

impl Handler for NullHandler {
    fn id(&self) -> &'static str {
        self.0.as_str()
    }

    fn operations(&self) -> Operations {
        let mut operations = Operations::new();
        for id in self.0.standard_operations() {
            operations.add(Box::new(NullOperation::new(*id)));
        }
        operations
    }
}

#[derive(Default)]
pub struct NullBuilder {
    handlers: HandlerSet,
}

impl NullBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Builder for NullBuilder {
    fn id(&self) -> &'static str {
        BUILDER_ID
    }

    fn supports(&self) -> &'static [Implementation] {
        Implementation::ALL
    }

    fn activate(
        &mut self,
        implementations: &[Implementation],
        _settings: &BuilderSettings,
        diag: &mut Diagnostics,
    ) -> Result<(), BuildError> {
        let accepted = supported_implementations(&*self, implementations, diag);
        self.handlers.clear();
        for implementation in accepted {
            self.handlers.push(NullHandler(implementation));
        }
        Ok(())
    }

    fn operations(&self) -> Operations {
        self.handlers.operations()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::run;

    #[tokio::test]
    async fn null_operation_succeeds() {
        let mut op = NullOperation::new("orchestrate.up");
        let result = run(&mut op).await;
        assert!(result.is_success());
        assert_eq!(result.operation, "orchestrate.up");
    }

    #[test]
    fn handler_covers_standard_ids() {
        let ops = NullHandler(Implementation::Config).operations();
        let ids: Vec<&str> = ops.ids().collect();
        assert_eq!(ids, ["config.list", "config.get", "config.set"]);
    }
}

// ABOUTME: security.* operations: who is running radi and what the rules say about an operation.

use crate::handler::Handler;
use crate::operation::{
    Operation, OperationError, OperationMeta, Operations, Properties, Property, PropertyKind,
    PropertyValue, Usage, operation_meta,
};
use crate::security::Authorizer;
use async_trait::async_trait;
use std::sync::Arc;

pub const USER_ID: &str = "security.user.id";
pub const USER_HOST: &str = "security.user.host";
pub const OPERATION: &str = "security.operation";
pub const DECISION: &str = "security.decision";
pub const ALLOWED: &str = "security.allowed";

pub struct SecurityUserOperation {
    meta: OperationMeta,
    properties: Properties,
    authorizer: Arc<dyn Authorizer>,
}

impl SecurityUserOperation {
    pub fn new(authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            meta: OperationMeta::new("security.user", "Current user", "Show the user rules are checked against."),
            properties: Properties::new()
                .with(Property::new(USER_ID, PropertyKind::String).label("User").usage(Usage::output()))
                .with(Property::new(USER_HOST, PropertyKind::String).label("Host").usage(Usage::output())),
            authorizer,
        }
    }
}

#[async_trait]
impl Operation for SecurityUserOperation {
    operation_meta!();

    async fn exec(&mut self) -> Result<(), OperationError> {
        let user = self.authorizer.user().clone();
        self.properties.set(USER_ID, PropertyValue::String(user.id))?;
        self.properties.set(USER_HOST, PropertyValue::String(user.host))?;
        Ok(())
    }
}

pub struct SecurityAuthorizeOperation {
    meta: OperationMeta,
    properties: Properties,
    authorizer: Arc<dyn Authorizer>,
}

impl SecurityAuthorizeOperation {
    pub fn new(authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            meta: OperationMeta::new(
                "security.authorize",
                "Check authorization",
                "Evaluate the rules for an operation.",
            )
            .with_help("Checks the current user unless security.user.id names another one.")
            .internal(),
            properties: Properties::new()
                .with(
                    Property::new(OPERATION, PropertyKind::String)
                        .label("Operation")
                        .usage(Usage::required()),
                )
                .with(Property::new(USER_ID, PropertyKind::String).label("User"))
                .with(
                    Property::new(DECISION, PropertyKind::String)
                        .label("Decision")
                        .description("allow, deny or neutral when no rule applied.")
                        .usage(Usage::output()),
                )
                .with(Property::new(ALLOWED, PropertyKind::Bool).label("Allowed").usage(Usage::output())),
            authorizer,
        }
    }
}

#[async_trait]
impl Operation for SecurityAuthorizeOperation {
    operation_meta!();

    async fn exec(&mut self) -> Result<(), OperationError> {
        let operation = self.properties.string(OPERATION).unwrap_or_default();
        let authorization = match self.properties.string(USER_ID).filter(|u| !u.is_empty()) {
            Some(user) => self.authorizer.check(operation, user),
            None => self.authorizer.authorize(operation),
        };

        self.properties.set(
            DECISION,
            PropertyValue::String(authorization.decision.to_string()),
        )?;
        self.properties
            .set(ALLOWED, PropertyValue::Bool(authorization.allowed))?;
        Ok(())
    }
}

pub struct SecurityHandler {
    authorizer: Arc<dyn Authorizer>,
}

impl SecurityHandler {
    pub fn new(authorizer: Arc<dyn Authorizer>) -> Self {
        Self { authorizer }
    }
}

impl Handler for SecurityHandler {
    fn id(&self) -> &'static str {
        "local.security"
    }

    fn operations(&self) -> Operations {
        Operations::new()
            .with(SecurityUserOperation::new(Arc::clone(&self.authorizer)))
            .with(SecurityAuthorizeOperation::new(Arc::clone(&self.authorizer)))
    }
}

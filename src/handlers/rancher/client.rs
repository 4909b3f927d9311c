// ABOUTME: Typed client for the Rancher v2-beta endpoints radi uses.
// ABOUTME: Environments resolve by id or name; stacks are looked up by name.

use super::types::{Collection, Environment, NewStack, Service, Stack, StackAction};
use crate::rest::{ApiError, Credentials, RestClient};
use crate::types::{EnvironmentId, StackId};
use std::time::Duration;
use urlencoding::encode;

const API: &str = "v2-beta";

#[derive(Debug, Clone)]
pub struct RancherClient {
    rest: RestClient,
}

impl RancherClient {
    pub fn new(url: &str, credentials: Option<Credentials>, timeout: Duration) -> Result<Self, ApiError> {
        Ok(Self {
            rest: RestClient::new(url, credentials, timeout)?,
        })
    }

    fn stacks_path(environment: &EnvironmentId) -> String {
        format!("{API}/projects/{}/stacks", encode(environment.as_str()))
    }

    fn stack_path(environment: &EnvironmentId, stack: &StackId) -> String {
        format!("{}/{}", Self::stacks_path(environment), encode(stack.as_str()))
    }

    pub async fn environments(&self) -> Result<Vec<Environment>, ApiError> {
        let list: Collection<Environment> = self.rest.get(&format!("{API}/projects")).await?;
        Ok(list.data)
    }

    /// The environment whose id or name is `key`; ids win over names.
    pub async fn environment(&self, key: &str) -> Result<Environment, ApiError> {
        let environments = self.environments().await?;
        let by_id = environments.iter().position(|e| e.id.as_str() == key);
        let index = by_id.or_else(|| environments.iter().position(|e| e.name == key));
        match index {
            Some(i) => Ok(environments[i].clone()),
            None => Err(ApiError::NotFound(format!("environment {key}"))),
        }
    }

    pub async fn find_stack(
        &self,
        environment: &EnvironmentId,
        name: &str,
    ) -> Result<Option<Stack>, ApiError> {
        let list: Collection<Stack> = self
            .rest
            .get_query(&Self::stacks_path(environment), &[("name", name)])
            .await?;
        Ok(list.data.into_iter().find(|s| s.name == name))
    }

    pub async fn create_stack(
        &self,
        environment: &EnvironmentId,
        stack: &NewStack,
    ) -> Result<Stack, ApiError> {
        tracing::info!(stack = %stack.name, environment = %environment, "creating stack");
        self.rest.post(&Self::stacks_path(environment), stack).await
    }

    pub async fn stack_action(
        &self,
        environment: &EnvironmentId,
        stack: &StackId,
        action: StackAction,
    ) -> Result<Stack, ApiError> {
        tracing::info!(stack = %stack, action = action.as_str(), "stack action");
        self.rest
            .post_action(&Self::stack_path(environment, stack), &[("action", action.as_str())])
            .await
    }

    pub async fn delete_stack(&self, environment: &EnvironmentId, stack: &StackId) -> Result<(), ApiError> {
        tracing::info!(stack = %stack, "deleting stack");
        self.rest.delete(&Self::stack_path(environment, stack)).await
    }

    pub async fn stack_services(
        &self,
        environment: &EnvironmentId,
        stack: &StackId,
    ) -> Result<Vec<Service>, ApiError> {
        let path = format!("{}/services", Self::stack_path(environment, stack));
        let list: Collection<Service> = self.rest.get(&path).await?;
        Ok(list.data)
    }
}

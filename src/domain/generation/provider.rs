//! Generation provider trait

use async_trait::async_trait;

use super::{GenerationRequest, TaskState};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Asynchronous image generation service (submit a job, poll it by task id)
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Submit a job, returning the provider task id
    async fn submit(&self, request: &GenerationRequest) -> Result<String, DomainError>;

    /// Query the current state of a task
    async fn poll(&self, task_id: &str) -> Result<TaskState, DomainError>;

    /// Channel name recorded in usage metadata
    fn provider_name(&self) -> &'static str;
}

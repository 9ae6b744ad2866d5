//! Collaborator seams consumed by the task loop, plus the per-run context
//! handed to every tool invocation.
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::error::RunnerError;
use crate::executor::types::{Task, TaskId};

/// Input for the task-creation collaborator.
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub objective: String,
    pub model: String,
    pub language: String,
}

/// Input for text generation (`text-completion` tasks).
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub objective: String,
    pub model: String,
    pub language: String,
    pub task_id: TaskId,
    pub task: String,
    /// Already truncated `"<description>: <output>\n"` lines of the dependencies.
    pub dependency_context: String,
}

/// Input for `web-search` tasks.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub objective: String,
    pub model: String,
    pub language: String,
    pub task_id: TaskId,
    /// The task description doubles as the search query.
    pub query: String,
    pub dependency_context: String,
}

/// Decomposes an objective into a dependency-annotated task list.
#[async_trait]
pub trait TaskCreator: Send + Sync {
    fn name(&self) -> &str;

    async fn create(
        &self,
        request: &CreateRequest,
        cancel: &CancellationToken,
    ) -> anyhow::Result<Vec<Task>>;
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(
        &self,
        request: &GenerateRequest,
        cancel: &CancellationToken,
    ) -> anyhow::Result<String>;
}

#[async_trait]
pub trait WebSearcher: Send + Sync {
    fn name(&self) -> &str;

    async fn search(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> anyhow::Result<String>;
}

/// Named request/response actions (the `github-tool` family).
#[async_trait]
pub trait ExternalActions: Send + Sync {
    fn name(&self) -> &str;

    async fn invoke(
        &self,
        action: &str,
        config: &Map<String, Value>,
        cancel: &CancellationToken,
    ) -> anyhow::Result<String>;
}

#[derive(Clone)]
pub struct Services {
    pub creator: Arc<dyn TaskCreator>,
    pub text: Arc<dyn TextGenerator>,
    pub search: Option<Arc<dyn WebSearcher>>,
    pub actions: Option<Arc<dyn ExternalActions>>,
}

#[async_trait]
pub trait ServicesFactory: Send + Sync {
    async fn build_services(&self, cfg: &AppConfig) -> Result<Services, RunnerError>;
}

/// Run-lifetime values shared by every task of one run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub objective: String,
    pub model: String,
    pub language: String,
    pub cancel: CancellationToken,
}

impl RunContext {
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

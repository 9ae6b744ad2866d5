use std::time::Instant;

use crate::context::{GenerateRequest, RunContext, SearchRequest, Services};
use crate::error::ToolError;
use crate::executor::task_list::TaskList;
use crate::executor::types::{Task, TaskOutcome, TaskResult, Tool, TOOL_GITHUB, TOOL_WEB_SEARCH};
use crate::executor::user_input::UserInputChannel;

/// Routes a task to the collaborator named by its tool.
///
/// Tool errors never escape: they become a `Failed` outcome with empty output,
/// and a run-level cancellation becomes `Cancelled`.
pub struct ToolDispatcher {
    services: Services,
    user_input: UserInputChannel,
    context_limit: usize,
}

impl ToolDispatcher {
    pub fn new(services: Services, user_input: UserInputChannel, context_limit: usize) -> Self {
        Self {
            services,
            user_input,
            context_limit,
        }
    }

    #[tracing::instrument(
        name = "dispatch",
        skip_all,
        fields(task_id = task.id, tool = %task.tool)
    )]
    pub async fn execute(&self, task: &Task, list: &TaskList, ctx: &RunContext) -> TaskResult {
        let started = Instant::now();

        let result = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => Err(ToolError::Cancelled),
            res = self.run_tool(task, list, ctx) => res,
        };

        let (output, outcome) = match result {
            Ok(output) => (output, TaskOutcome::Succeeded),
            Err(ToolError::Cancelled) => {
                tracing::debug!("task cancelled in flight");
                (String::new(), TaskOutcome::Cancelled)
            }
            Err(err) => {
                let reason = match &err {
                    ToolError::Collaborator(inner) => format!("{inner:#}"),
                    other => other.to_string(),
                };
                tracing::warn!(error = %reason, "task failed; recording empty output");
                (String::new(), TaskOutcome::Failed { reason })
            }
        };

        TaskResult {
            task_id: task.id,
            output,
            outcome,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    async fn run_tool(
        &self,
        task: &Task,
        list: &TaskList,
        ctx: &RunContext,
    ) -> Result<String, ToolError> {
        match &task.tool {
            Tool::TextCompletion => {
                let request = GenerateRequest {
                    objective: ctx.objective.clone(),
                    model: ctx.model.clone(),
                    language: ctx.language.clone(),
                    task_id: task.id,
                    task: task.description.clone(),
                    dependency_context: list.dependency_context(task, self.context_limit),
                };
                Ok(self.services.text.generate(&request, &ctx.cancel).await?)
            }
            Tool::WebSearch => {
                let searcher = self
                    .services
                    .search
                    .as_ref()
                    .ok_or(ToolError::NotConfigured(TOOL_WEB_SEARCH))?;
                let request = SearchRequest {
                    objective: ctx.objective.clone(),
                    model: ctx.model.clone(),
                    language: ctx.language.clone(),
                    task_id: task.id,
                    query: task.description.clone(),
                    dependency_context: list.dependency_context(task, self.context_limit),
                };
                Ok(searcher.search(&request, &ctx.cancel).await?)
            }
            Tool::UserInput => {
                self.user_input
                    .wait(&ctx.run_id, task.id, &task.description)
                    .await
            }
            Tool::GitHub { action, config } => {
                let actions = self
                    .services
                    .actions
                    .as_ref()
                    .ok_or(ToolError::NotConfigured(TOOL_GITHUB))?;
                Ok(actions.invoke(action, config, &ctx.cancel).await?)
            }
            Tool::Unknown(name) => {
                tracing::warn!(tool = %name, "unknown tool; producing empty output");
                Ok(String::new())
            }
        }
    }
}

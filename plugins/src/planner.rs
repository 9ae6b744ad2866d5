//! Planner: asks the chat model to decompose an objective into a task list and
//! parses whatever JSON array comes back.
use std::sync::{Arc, OnceLock};

use anyhow::Context;
use async_trait::async_trait;
use regex::Regex;
use taskmesh_core::api::{CreateRequest, Task, TaskCreator, TaskStatus};
use tokio_util::sync::CancellationToken;

use crate::llm::prompt::{self, ToolOffer};
use crate::llm::{ChatMessage, OpenAiClient};

pub struct LlmTaskCreator {
    client: Arc<OpenAiClient>,
    offer: ToolOffer,
}

impl LlmTaskCreator {
    pub fn new(client: Arc<OpenAiClient>, offer: ToolOffer) -> Self {
        Self { client, offer }
    }
}

#[async_trait]
impl TaskCreator for LlmTaskCreator {
    fn name(&self) -> &str {
        "llm-planner"
    }

    async fn create(
        &self,
        request: &CreateRequest,
        cancel: &CancellationToken,
    ) -> anyhow::Result<Vec<Task>> {
        let prompt = prompt::task_creation(&request.objective, &request.language, self.offer);
        let reply = self
            .client
            .chat(&request.model, &[ChatMessage::user(prompt)], cancel)
            .await
            .context("task creation request failed")?;
        tracing::debug!(reply_len = reply.len(), "task creation reply");
        parse_task_list(&reply)
    }
}

fn fenced_block() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").ok())
        .as_ref()
}

/// Extract the task array from a model reply.
///
/// Accepts a bare array, an array inside a fenced ```json block, or an array
/// surrounded by prose. Every task starts `incomplete` with no output.
pub fn parse_task_list(reply: &str) -> anyhow::Result<Vec<Task>> {
    let body = fenced_block()
        .and_then(|re| re.captures(reply))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(reply);

    let start = body
        .find('[')
        .ok_or_else(|| anyhow::anyhow!("no JSON array in task creation reply"))?;
    let end = body
        .rfind(']')
        .filter(|end| *end > start)
        .ok_or_else(|| anyhow::anyhow!("unterminated JSON array in task creation reply"))?;

    let mut tasks: Vec<Task> =
        serde_json::from_str(&body[start..=end]).context("task list is not valid JSON")?;
    if tasks.is_empty() {
        anyhow::bail!("task creation returned an empty task list");
    }

    for task in &mut tasks {
        task.status = TaskStatus::Incomplete;
        task.output = None;
        task.outcome = None;
    }
    Ok(tasks)
}

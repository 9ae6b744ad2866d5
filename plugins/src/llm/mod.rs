pub mod openai;
pub mod prompt;

use std::sync::Arc;

use async_trait::async_trait;
use taskmesh_core::api::{GenerateRequest, TextGenerator};
use tokio_util::sync::CancellationToken;

pub use openai::{ChatMessage, OpenAiClient, Role};

/// `text-completion` backed by a chat model.
pub struct LlmTextGenerator {
    client: Arc<OpenAiClient>,
}

impl LlmTextGenerator {
    pub fn new(client: Arc<OpenAiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TextGenerator for LlmTextGenerator {
    fn name(&self) -> &str {
        "llm-text"
    }

    async fn generate(
        &self,
        request: &GenerateRequest,
        cancel: &CancellationToken,
    ) -> anyhow::Result<String> {
        let prompt = prompt::text_completion(
            &request.objective,
            &request.language,
            &request.task,
            &request.dependency_context,
        );
        tracing::debug!(
            task_id = request.task_id,
            context_len = request.dependency_context.len(),
            "text completion"
        );
        self.client
            .chat(&request.model, &[ChatMessage::user(prompt)], cancel)
            .await
    }
}

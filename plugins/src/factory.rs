use std::sync::Arc;

use anyhow::Result;

use taskmesh_core::api::{
    AppConfig, ExternalActions, OutputFormat, OutputRendererPlugin, TaskCreator, TextGenerator,
    WebSearcher,
};

use crate::executor::{JsonlRendererPlugin, TextRendererPlugin};
use crate::github::GitHubActions;
use crate::llm::prompt::ToolOffer;
use crate::llm::{LlmTextGenerator, OpenAiClient};
use crate::planner::LlmTaskCreator;
use crate::search::WebSearchTool;

pub fn build_llm(cfg: &AppConfig) -> Result<Arc<OpenAiClient>> {
    Ok(Arc::new(OpenAiClient::new(&cfg.llm)?))
}

/// Tools the task creator may hand out, given what is configured.
pub fn tool_offer(cfg: &AppConfig) -> ToolOffer {
    ToolOffer {
        web_search: cfg.search.is_enabled(),
        user_input: true,
        github: cfg.github.is_enabled(),
    }
}

pub fn build_creator(cfg: &AppConfig, llm: Arc<OpenAiClient>) -> Arc<dyn TaskCreator> {
    Arc::new(LlmTaskCreator::new(llm, tool_offer(cfg)))
}

pub fn build_text(llm: Arc<OpenAiClient>) -> Arc<dyn TextGenerator> {
    Arc::new(LlmTextGenerator::new(llm))
}

pub fn build_search(
    cfg: &AppConfig,
    llm: Arc<OpenAiClient>,
) -> Result<Option<Arc<dyn WebSearcher>>> {
    if !cfg.search.is_enabled() {
        return Ok(None);
    }
    Ok(Some(Arc::new(WebSearchTool::new(&cfg.search, llm)?)))
}

pub fn build_actions(cfg: &AppConfig) -> Result<Option<Arc<dyn ExternalActions>>> {
    if !cfg.github.is_enabled() {
        return Ok(None);
    }
    Ok(Some(Arc::new(GitHubActions::new(&cfg.github)?)))
}

/// `progress` is honored only for the text format.
pub fn build_renderer(format: OutputFormat, ascii: bool, progress: bool) -> Arc<dyn OutputRendererPlugin> {
    match format {
        OutputFormat::Jsonl => Arc::new(JsonlRendererPlugin::new(false)),
        OutputFormat::Text => Arc::new(TextRendererPlugin::new(ascii, progress)),
    }
}

//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `taskmesh_core::api` instead of reaching into internal modules.

pub use crate::config::{
    load_default, load_from_path, AppConfig, ExecutorConfig, GitHubConfig, LlmConfig,
    LoggingConfig, OutputConfig, OutputFormat, SearchConfig, SearchProvider, StallPolicy,
};
pub use crate::context::{
    CreateRequest, ExternalActions, GenerateRequest, RunContext, SearchRequest, Services,
    ServicesFactory, TaskCreator, TextGenerator, WebSearcher,
};
pub use crate::error::{CliError, ExecutorError, RunnerError, ToolError};
pub use crate::executor::traits::OutputRendererPlugin;
pub use crate::executor::{
    EventEnvelope, ProgressMonitor, RunController, RunControllerBuilder, RunEvent, RunReport,
    RunStatus, Task, TaskId, TaskList, TaskListIssue, TaskOutcome, TaskStatus, Tool,
};
pub use crate::executor::types::{TOOL_GITHUB, TOOL_TEXT_COMPLETION, TOOL_USER_INPUT, TOOL_WEB_SEARCH};

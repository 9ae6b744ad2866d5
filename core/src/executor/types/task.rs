use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Task identifier, unique within a run and assigned by the task creator.
pub type TaskId = u32;

/// Lifecycle state of a task: `incomplete -> running -> complete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Incomplete,
    Running,
    Complete,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Incomplete => "incomplete",
            Self::Running => "running",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const TOOL_TEXT_COMPLETION: &str = "text-completion";
pub const TOOL_WEB_SEARCH: &str = "web-search";
pub const TOOL_USER_INPUT: &str = "user-input";
pub const TOOL_GITHUB: &str = "github-tool";

/// Capability used to produce a task's output.
#[derive(Debug, Clone, PartialEq)]
pub enum Tool {
    TextCompletion,
    WebSearch,
    UserInput,
    /// Named GitHub action with its task-supplied configuration payload.
    GitHub {
        action: String,
        config: Map<String, Value>,
    },
    /// Tool name the producer emitted but nothing here understands.
    Unknown(String),
}

impl Tool {
    pub fn name(&self) -> &str {
        match self {
            Self::TextCompletion => TOOL_TEXT_COMPLETION,
            Self::WebSearch => TOOL_WEB_SEARCH,
            Self::UserInput => TOOL_USER_INPUT,
            Self::GitHub { .. } => TOOL_GITHUB,
            Self::Unknown(name) => name,
        }
    }

    fn from_parts(tool: &str, action: Option<String>, config: Option<Map<String, Value>>) -> Self {
        match tool.trim() {
            TOOL_TEXT_COMPLETION => Self::TextCompletion,
            TOOL_WEB_SEARCH => Self::WebSearch,
            TOOL_USER_INPUT => Self::UserInput,
            TOOL_GITHUB => Self::GitHub {
                action: action.unwrap_or_default(),
                config: config.unwrap_or_default(),
            },
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GitHub { action, .. } if !action.is_empty() => {
                write!(f, "{}:{}", TOOL_GITHUB, action)
            }
            other => f.write_str(other.name()),
        }
    }
}

/// How a completed task ended. Failures still count as `complete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskOutcome {
    Succeeded,
    Failed { reason: String },
    Cancelled,
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// One unit of work within a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TaskRecord", into = "TaskRecord")]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    pub tool: Tool,
    pub dependent_task_ids: Vec<TaskId>,
    pub status: TaskStatus,
    /// Present only once the task is complete.
    pub output: Option<String>,
    pub outcome: Option<TaskOutcome>,
}

impl Task {
    pub fn new(id: TaskId, description: impl Into<String>, tool: Tool) -> Self {
        Self {
            id,
            description: description.into(),
            tool,
            dependent_task_ids: Vec::new(),
            status: TaskStatus::Incomplete,
            output: None,
            outcome: None,
        }
    }

    pub fn with_dependencies(mut self, ids: impl IntoIterator<Item = TaskId>) -> Self {
        for id in ids {
            if !self.dependent_task_ids.contains(&id) {
                self.dependent_task_ids.push(id);
            }
        }
        self
    }

    pub fn is_complete(&self) -> bool {
        self.status == TaskStatus::Complete
    }
}

/// Wire shape shared with the task-creation prompt (`task`, `dependent_task_ids`,
/// `result`) while accepting the camelCase spellings some producers emit.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TaskRecord {
    id: TaskId,
    #[serde(alias = "description")]
    task: String,
    tool: String,
    #[serde(default, alias = "dependentTaskIds")]
    dependent_task_ids: Option<Vec<TaskId>>,
    #[serde(default)]
    status: TaskStatus,
    #[serde(default, alias = "result")]
    output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    outcome: Option<TaskOutcome>,
    #[serde(default, alias = "action", skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    config: Option<Map<String, Value>>,
}

impl From<TaskRecord> for Task {
    fn from(record: TaskRecord) -> Self {
        let tool = Tool::from_parts(&record.tool, record.name, record.config);
        Task {
            id: record.id,
            description: record.task,
            tool,
            dependent_task_ids: Vec::new(),
            status: record.status,
            output: record.output,
            outcome: record.outcome,
        }
        .with_dependencies(record.dependent_task_ids.unwrap_or_default())
    }
}

impl From<Task> for TaskRecord {
    fn from(task: Task) -> Self {
        let tool = task.tool.name().to_string();
        let (name, config) = match task.tool {
            Tool::GitHub { action, config } => (Some(action), Some(config)),
            _ => (None, None),
        };
        TaskRecord {
            id: task.id,
            task: task.description,
            tool,
            dependent_task_ids: Some(task.dependent_task_ids),
            status: task.status,
            output: task.output,
            outcome: task.outcome,
            name,
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_prompt_shape() {
        let raw = r#"{"id":2,"task":"Summarize","tool":"text-completion","dependent_task_ids":[1,1],"status":"incomplete","result":null}"#;
        let task: Task = serde_json::from_str(raw).unwrap();
        assert_eq!(task.id, 2);
        assert_eq!(task.tool, Tool::TextCompletion);
        assert_eq!(task.dependent_task_ids, vec![1]);
        assert_eq!(task.status, TaskStatus::Incomplete);
        assert!(task.output.is_none());
    }

    #[test]
    fn test_parse_camel_case_and_null_dependencies() {
        let raw = r#"{"id":1,"task":"Ask","tool":"user-input","dependentTaskIds":null}"#;
        let task: Task = serde_json::from_str(raw).unwrap();
        assert_eq!(task.tool, Tool::UserInput);
        assert!(task.dependent_task_ids.is_empty());
    }

    #[test]
    fn test_github_tool_keeps_action_and_config() {
        let raw = r#"{"id":3,"task":"Open issue","tool":"github-tool","name":"createIssue","config":{"owner":"o","repo":"r"}}"#;
        let task: Task = serde_json::from_str(raw).unwrap();
        match &task.tool {
            Tool::GitHub { action, config } => {
                assert_eq!(action, "createIssue");
                assert_eq!(config.get("repo").and_then(|v| v.as_str()), Some("r"));
            }
            other => panic!("unexpected tool: {other:?}"),
        }
        assert_eq!(task.tool.to_string(), "github-tool:createIssue");

        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["tool"], "github-tool");
        assert_eq!(value["name"], "createIssue");
    }

    #[test]
    fn test_unknown_tool_is_preserved() {
        let raw = r#"{"id":4,"task":"Paint","tool":"brush"}"#;
        let task: Task = serde_json::from_str(raw).unwrap();
        assert_eq!(task.tool, Tool::Unknown("brush".to_string()));
        assert_eq!(task.tool.name(), "brush");
    }
}

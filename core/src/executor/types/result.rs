use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::task::{Task, TaskId, TaskOutcome};

/// Result of executing a single task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResult {
    /// Task identifier
    pub task_id: TaskId,

    /// Produced text; empty on failure or cancellation
    pub output: String,

    /// Whether the tool succeeded, failed or was cut short
    pub outcome: TaskOutcome,

    /// Execution duration in milliseconds
    pub duration_ms: u64,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunStatus {
    /// No incomplete task remains.
    Finished,
    /// The cancellation signal was set.
    Cancelled,
    /// Incomplete tasks remain but none can ever become ready.
    Stalled { blocked: Vec<TaskId> },
    /// The task creator failed or returned nothing.
    CreationFailed { reason: String },
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Finished => "finished",
            Self::Cancelled => "cancelled",
            Self::Stalled { .. } => "stalled",
            Self::CreationFailed { .. } => "creation_failed",
        }
    }
}

/// Terminal report of one objective run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub objective: String,
    pub status: RunStatus,
    pub tasks: Vec<Task>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl RunReport {
    pub fn completed(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_complete()).count()
    }

    pub fn failed(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| matches!(t.outcome, Some(TaskOutcome::Failed { .. })))
            .count()
    }

    /// `OBJECTIVE: ...` followed by every completed task's output, in list order.
    pub fn session_summary(&self) -> String {
        let mut summary = format!("OBJECTIVE: {}\n\n", self.objective);
        for task in self.tasks.iter().filter(|t| t.is_complete()) {
            let _ = writeln!(summary, "{}. {}", task.id, task.description);
            let _ = writeln!(summary, "{}\n", task.output.as_deref().unwrap_or_default());
        }
        summary
    }
}

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use super::traits::OutputRendererPlugin;
use super::types::{RunStatus, Task, TaskId, TaskOutcome};

/// Progress and status notifications emitted during a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RunEvent {
    Creating,
    TaskListCreated { tasks: Vec<Task> },
    Preparing,
    Executing { running_ids: Vec<TaskId>, total: usize },
    UserInput { task_id: TaskId, question: String },
    TaskCompleted {
        task_id: TaskId,
        outcome: TaskOutcome,
        output: String,
        duration_ms: u64,
    },
    Failed { reason: String },
    Finished { status: RunStatus },
}

impl RunEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Creating => "creating",
            Self::TaskListCreated { .. } => "task-list-created",
            Self::Preparing => "preparing",
            Self::Executing { .. } => "executing",
            Self::UserInput { .. } => "user-input",
            Self::TaskCompleted { .. } => "task-completed",
            Self::Failed { .. } => "failed",
            Self::Finished { .. } => "finished",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventEnvelope {
    pub run_id: String,
    pub ts: DateTime<Utc>,
    #[serde(flatten)]
    pub event: RunEvent,
}

/// Fire-and-forget fan-out to renderers and broadcast subscribers.
#[derive(Clone)]
pub struct EventHub {
    renderers: Vec<Arc<dyn OutputRendererPlugin>>,
    tx: broadcast::Sender<EventEnvelope>,
}

impl EventHub {
    pub fn new(renderers: Vec<Arc<dyn OutputRendererPlugin>>) -> Self {
        let (tx, _) = broadcast::channel(1000);
        Self { renderers, tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.tx.subscribe()
    }

    pub fn emit(&self, run_id: &str, event: RunEvent) {
        tracing::debug!(run_id = %run_id, event = event.kind(), "run event");
        let envelope = EventEnvelope {
            run_id: run_id.to_string(),
            ts: Utc::now(),
            event,
        };
        for renderer in &self.renderers {
            renderer.render(&envelope);
        }
        // No subscribers is fine.
        let _ = self.tx.send(envelope);
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

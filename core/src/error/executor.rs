use thiserror::Error;

use crate::executor::types::{TaskId, TaskStatus};

/// Errors raised by the task loop itself (not by individual tools).
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Invalid transition for task {task_id}: {from} -> {to}")]
    InvalidTransition {
        task_id: TaskId,
        from: TaskStatus,
        to: TaskStatus,
    },

    #[error("A run is already in progress")]
    AlreadyRunning,
}

/// Errors produced while a single task's tool executes.
///
/// These never escape the dispatcher: they are folded into a failed or
/// cancelled task outcome.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("cancelled")]
    Cancelled,

    #[error("tool '{0}' is not configured")]
    NotConfigured(&'static str),

    #[error("task {0} is already waiting for user input")]
    InputAlreadyPending(TaskId),

    #[error("user input channel closed for task {0}")]
    InputClosed(TaskId),

    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
}

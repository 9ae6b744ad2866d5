//! Per-task suspension table for `user-input` tasks.
//!
//! `wait` parks exactly one execution per task id until `resolve` delivers a
//! value. Suspensions are independent of each other and only block the
//! future that awaits them.
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::oneshot;

use crate::error::ToolError;
use crate::executor::events::{EventHub, RunEvent};
use crate::executor::types::TaskId;

#[derive(Clone)]
pub struct UserInputChannel {
    pending: Arc<Mutex<HashMap<TaskId, oneshot::Sender<String>>>>,
    events: EventHub,
}

/// Drops the pending entry if the waiting future goes away (cancellation).
struct PendingGuard<'a> {
    channel: &'a UserInputChannel,
    task_id: TaskId,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.channel.lock().remove(&self.task_id);
    }
}

impl UserInputChannel {
    pub fn new(events: EventHub) -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TaskId, oneshot::Sender<String>>> {
        match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Register a suspension for `task_id`, announce it, and wait for the answer.
    pub async fn wait(
        &self,
        run_id: &str,
        task_id: TaskId,
        question: &str,
    ) -> Result<String, ToolError> {
        let rx = {
            let mut pending = self.lock();
            if pending.contains_key(&task_id) {
                return Err(ToolError::InputAlreadyPending(task_id));
            }
            let (tx, rx) = oneshot::channel();
            pending.insert(task_id, tx);
            rx
        };
        let _guard = PendingGuard {
            channel: self,
            task_id,
        };

        tracing::info!(task_id, "waiting for user input");
        self.events.emit(
            run_id,
            RunEvent::UserInput {
                task_id,
                question: question.to_string(),
            },
        );

        rx.await.map_err(|_| ToolError::InputClosed(task_id))
    }

    /// Deliver `value` to the suspension for `task_id`. Returns false (and does
    /// nothing) when no suspension is pending.
    pub fn resolve(&self, task_id: TaskId, value: impl Into<String>) -> bool {
        let Some(tx) = self.lock().remove(&task_id) else {
            tracing::debug!(task_id, "no pending user input; ignoring");
            return false;
        };
        tx.send(value.into()).is_ok()
    }

    pub fn is_pending(&self, task_id: TaskId) -> bool {
        self.lock().contains_key(&task_id)
    }

    pub fn pending_ids(&self) -> Vec<TaskId> {
        let mut ids: Vec<TaskId> = self.lock().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Drop every suspension; waiters observe a closed channel.
    pub fn clear(&self) {
        self.lock().clear();
    }
}

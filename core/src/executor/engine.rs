use crate::config::StallPolicy;
use crate::context::RunContext;
use crate::error::ExecutorError;

use super::dispatch::ToolDispatcher;
use super::events::{EventHub, RunEvent};
use super::scheduler::execute_round;
use super::task_list::TaskList;
use super::types::{TaskId, TaskOutcome, TaskResult};

/// Why the round loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopExit {
    /// No incomplete task remains.
    Drained,
    Cancelled,
    /// Incomplete tasks remain but none is ready and the policy says stop.
    Stalled(Vec<TaskId>),
}

/// Round-based scheduler: select ready tasks, run them concurrently, join, apply.
///
/// Task list mutations happen only between rounds, on the caller's task, so
/// executions read dependency outputs through a plain shared borrow.
pub struct TaskLoop<'a> {
    dispatcher: &'a ToolDispatcher,
    events: &'a EventHub,
    max_batch_size: usize,
    stall_policy: StallPolicy,
}

impl<'a> TaskLoop<'a> {
    pub fn new(dispatcher: &'a ToolDispatcher, events: &'a EventHub) -> Self {
        Self {
            dispatcher,
            events,
            max_batch_size: 5,
            stall_policy: StallPolicy::default(),
        }
    }

    pub fn with_max_batch_size(mut self, size: usize) -> Self {
        self.max_batch_size = size.max(1);
        self
    }

    pub fn with_stall_policy(mut self, policy: StallPolicy) -> Self {
        self.stall_policy = policy;
        self
    }

    #[tracing::instrument(name = "task_loop", skip_all, fields(run_id = %ctx.run_id))]
    pub async fn run(&self, list: &mut TaskList, ctx: &RunContext) -> Result<LoopExit, ExecutorError> {
        let mut round = 0usize;

        loop {
            if ctx.is_cancelled() {
                tracing::info!(round, "run cancelled; no further rounds");
                return Ok(LoopExit::Cancelled);
            }
            if !list.has_incomplete() {
                tracing::info!(round, "all tasks complete");
                return Ok(LoopExit::Drained);
            }

            self.events.emit(&ctx.run_id, RunEvent::Preparing);

            let batch: Vec<TaskId> = list
                .ready()
                .into_iter()
                .take(self.max_batch_size)
                .map(|t| t.id)
                .collect();

            if batch.is_empty() {
                let blocked = list.incomplete_ids();
                match self.stall_policy {
                    StallPolicy::Finish => {
                        tracing::warn!(?blocked, "no task can become ready; stopping");
                        return Ok(LoopExit::Stalled(blocked));
                    }
                    // Nothing is running between rounds, so readiness cannot
                    // change any more. Only cancellation ends the wait.
                    StallPolicy::Wait => {
                        tracing::warn!(?blocked, "no task can become ready; waiting for cancellation");
                        ctx.cancel.cancelled().await;
                        tracing::info!(round, "run cancelled while stalled");
                        return Ok(LoopExit::Cancelled);
                    }
                }
            }

            round += 1;
            for id in &batch {
                list.mark_running(*id)?;
            }
            tracing::debug!(round, tasks = ?batch, "dispatching round");
            self.events.emit(
                &ctx.run_id,
                RunEvent::Executing {
                    running_ids: list.running_ids(),
                    total: list.len(),
                },
            );

            let mut results = {
                let snapshot: &TaskList = list;
                execute_round(&batch, snapshot, |task| {
                    self.dispatcher.execute(task, snapshot, ctx)
                })
                .await
            };

            for id in &batch {
                let result = results.remove(id).unwrap_or_else(|| TaskResult {
                    task_id: *id,
                    output: String::new(),
                    outcome: TaskOutcome::Failed {
                        reason: "no result produced".into(),
                    },
                    duration_ms: 0,
                });
                list.complete(*id, result.output.clone(), result.outcome.clone())?;
                self.events.emit(
                    &ctx.run_id,
                    RunEvent::TaskCompleted {
                        task_id: result.task_id,
                        outcome: result.outcome,
                        output: result.output,
                        duration_ms: result.duration_ms,
                    },
                );
            }
        }
    }
}

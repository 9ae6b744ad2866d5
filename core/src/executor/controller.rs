use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::ExecutorConfig;
use crate::context::{CreateRequest, RunContext, Services};
use crate::error::ExecutorError;

use super::dispatch::ToolDispatcher;
use super::engine::{LoopExit, TaskLoop};
use super::events::{EventEnvelope, EventHub, RunEvent};
use super::task_list::TaskList;
use super::traits::OutputRendererPlugin;
use super::types::{RunReport, RunStatus, Task, TaskId, TaskStatus};
use super::user_input::UserInputChannel;

/// Entry point for running objectives.
///
/// Cheap to clone; clones share the active run, so one handle can `start`
/// while another calls `cancel` or `resolve_user_input`.
#[derive(Clone)]
pub struct RunController {
    inner: Arc<Inner>,
}

struct Inner {
    services: Services,
    config: ExecutorConfig,
    events: EventHub,
    user_input: UserInputChannel,
    active: Mutex<Option<CancellationToken>>,
}

pub struct RunControllerBuilder {
    services: Services,
    config: ExecutorConfig,
    renderers: Vec<Arc<dyn OutputRendererPlugin>>,
}

impl RunControllerBuilder {
    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn OutputRendererPlugin>) -> Self {
        self.renderers.push(renderer);
        self
    }

    pub fn build(self) -> RunController {
        let events = EventHub::new(self.renderers);
        let user_input = UserInputChannel::new(events.clone());
        RunController {
            inner: Arc::new(Inner {
                services: self.services,
                config: self.config,
                events,
                user_input,
                active: Mutex::new(None),
            }),
        }
    }
}

/// Clears the active-run slot and any leftover suspensions when a run ends.
struct ActiveRun<'a> {
    inner: &'a Inner,
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        self.inner.user_input.clear();
        *self.inner.active_slot() = None;
    }
}

impl Inner {
    fn active_slot(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        match self.active.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl RunController {
    pub fn builder(services: Services) -> RunControllerBuilder {
        RunControllerBuilder {
            services,
            config: ExecutorConfig::default(),
            renderers: Vec::new(),
        }
    }

    pub fn new(services: Services, config: ExecutorConfig) -> Self {
        Self::builder(services).config(config).build()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.inner.events.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.inner.active_slot().is_some()
    }

    /// Set the active run's cancellation signal. Returns false if nothing is running.
    pub fn cancel(&self) -> bool {
        match self.inner.active_slot().as_ref() {
            Some(token) => {
                tracing::info!("cancelling active run");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Answer a pending `user-input` task. Unmatched ids are ignored.
    pub fn resolve_user_input(&self, task_id: TaskId, message: impl Into<String>) -> bool {
        self.inner.user_input.resolve(task_id, message)
    }

    pub fn pending_user_inputs(&self) -> Vec<TaskId> {
        self.inner.user_input.pending_ids()
    }

    /// Create a task list for `objective` and drive it to completion.
    ///
    /// Task-creation failure and cancellation are reported through
    /// `RunReport::status`, not as errors.
    #[tracing::instrument(name = "run", skip_all, fields(model = %model.as_ref()))]
    pub async fn start(
        &self,
        objective: impl Into<String>,
        model: impl AsRef<str>,
        language: impl Into<String>,
    ) -> Result<RunReport, ExecutorError> {
        let cancel = {
            let mut slot = self.inner.active_slot();
            if slot.is_some() {
                return Err(ExecutorError::AlreadyRunning);
            }
            let token = CancellationToken::new();
            *slot = Some(token.clone());
            token
        };
        let _active = ActiveRun { inner: &self.inner };

        let ctx = RunContext {
            run_id: Uuid::new_v4().to_string(),
            objective: objective.into(),
            model: model.as_ref().to_string(),
            language: language.into(),
            cancel,
        };
        let started_at = Utc::now();
        let clock = Instant::now();
        tracing::info!(run_id = %ctx.run_id, "run started");

        let (status, tasks) = self.drive(&ctx).await?;

        self.inner.events.emit(
            &ctx.run_id,
            RunEvent::Finished {
                status: status.clone(),
            },
        );
        tracing::info!(run_id = %ctx.run_id, status = status.as_str(), "run finished");

        Ok(RunReport {
            run_id: ctx.run_id,
            objective: ctx.objective,
            status,
            tasks,
            started_at,
            finished_at: Utc::now(),
            duration_ms: clock.elapsed().as_millis() as u64,
        })
    }

    async fn drive(&self, ctx: &RunContext) -> Result<(RunStatus, Vec<Task>), ExecutorError> {
        let inner = &self.inner;
        inner.events.emit(&ctx.run_id, RunEvent::Creating);

        let tasks = match self.create_tasks(ctx).await {
            Ok(tasks) => tasks,
            Err(_) if ctx.is_cancelled() => return Ok((RunStatus::Cancelled, Vec::new())),
            Err(reason) => {
                tracing::error!(error = %reason, "task creation failed");
                inner.events.emit(
                    &ctx.run_id,
                    RunEvent::Failed {
                        reason: reason.clone(),
                    },
                );
                return Ok((RunStatus::CreationFailed { reason }, Vec::new()));
            }
        };

        let mut list = TaskList::new(tasks);
        for issue in list.validate() {
            tracing::warn!(%issue, "task list issue");
        }
        inner.events.emit(
            &ctx.run_id,
            RunEvent::TaskListCreated {
                tasks: list.as_slice().to_vec(),
            },
        );

        let dispatcher = ToolDispatcher::new(
            inner.services.clone(),
            inner.user_input.clone(),
            inner.config.dependency_context_limit,
        );
        let exit = TaskLoop::new(&dispatcher, &inner.events)
            .with_max_batch_size(inner.config.max_batch_size)
            .with_stall_policy(inner.config.stall_policy)
            .run(&mut list, ctx)
            .await?;

        let status = match exit {
            LoopExit::Drained => RunStatus::Finished,
            LoopExit::Cancelled => RunStatus::Cancelled,
            LoopExit::Stalled(blocked) => RunStatus::Stalled { blocked },
        };
        Ok((status, list.into_tasks()))
    }

    /// Ask the creator for tasks, racing it against cancellation.
    async fn create_tasks(&self, ctx: &RunContext) -> Result<Vec<Task>, String> {
        let request = CreateRequest {
            objective: ctx.objective.clone(),
            model: ctx.model.clone(),
            language: ctx.language.clone(),
        };
        let creator = &self.inner.services.creator;

        let created = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => return Err("cancelled".to_string()),
            res = creator.create(&request, &ctx.cancel) => res,
        };

        let mut tasks = created.map_err(|e| format!("{e:#}"))?;
        if tasks.is_empty() {
            return Err(format!("{} returned no tasks", creator.name()));
        }
        for task in &mut tasks {
            task.status = TaskStatus::Incomplete;
            task.output = None;
            task.outcome = None;
        }
        tracing::info!(count = tasks.len(), creator = creator.name(), "task list created");
        Ok(tasks)
    }
}

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use taskmesh_core::api::{
    CreateRequest, EventEnvelope, GenerateRequest, RunEvent, Services, Task, TaskCreator, TaskId,
    TextGenerator,
};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Returns a fixed task list, or an error when built with `failing`.
pub struct StaticCreator {
    tasks: Vec<Task>,
    error: Option<String>,
}

impl StaticCreator {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks, error: None }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            tasks: Vec::new(),
            error: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl TaskCreator for StaticCreator {
    fn name(&self) -> &str {
        "static"
    }

    async fn create(
        &self,
        _request: &CreateRequest,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<Vec<Task>> {
        match &self.error {
            Some(message) => anyhow::bail!("{message}"),
            None => Ok(self.tasks.clone()),
        }
    }
}

/// Text generator driven by keywords in the task description:
/// `fail` errors, `hang` never returns, `slow` sleeps a little.
#[derive(Default)]
pub struct ScriptedText {
    pub started: Mutex<Vec<TaskId>>,
    pub contexts: Mutex<HashMap<TaskId, String>>,
    in_flight: AtomicUsize,
    pub peak: AtomicUsize,
}

impl ScriptedText {
    pub fn started(&self) -> Vec<TaskId> {
        self.started.lock().unwrap().clone()
    }

    pub fn context_of(&self, id: TaskId) -> Option<String> {
        self.contexts.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl TextGenerator for ScriptedText {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        request: &GenerateRequest,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<String> {
        self.started.lock().unwrap().push(request.task_id);
        self.contexts
            .lock()
            .unwrap()
            .insert(request.task_id, request.dependency_context.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let task = request.task.as_str();
        if task.contains("hang") {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        } else if task.contains("slow") {
            tokio::time::sleep(Duration::from_millis(30)).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if task.contains("fail") {
            anyhow::bail!("generator refused task {}", request.task_id);
        }
        Ok(format!("out{}", request.task_id))
    }
}

/// Route `tracing` output through the test harness; `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn services(creator: StaticCreator, text: Arc<ScriptedText>) -> Services {
    Services {
        creator: Arc::new(creator),
        text,
        search: None,
        actions: None,
    }
}

/// Wait (bounded) for the first event matching `pred`.
pub async fn wait_for<F>(rx: &mut broadcast::Receiver<EventEnvelope>, pred: F) -> RunEvent
where
    F: Fn(&RunEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match rx.recv().await {
                Ok(envelope) if pred(&envelope.event) => return envelope.event,
                Ok(_) => continue,
                Err(err) => panic!("event stream ended: {err}"),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

/// Everything already buffered on the receiver.
pub fn drain(rx: &mut broadcast::Receiver<EventEnvelope>) -> Vec<RunEvent> {
    let mut events = Vec::new();
    while let Ok(envelope) = rx.try_recv() {
        events.push(envelope.event);
    }
    events
}

pub fn executing_rounds(events: &[RunEvent]) -> Vec<Vec<TaskId>> {
    events
        .iter()
        .filter_map(|e| match e {
            RunEvent::Executing { running_ids, .. } => Some(running_ids.clone()),
            _ => None,
        })
        .collect()
}

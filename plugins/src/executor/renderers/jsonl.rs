use taskmesh_core::api::{EventEnvelope, OutputRendererPlugin, RunEvent};
use serde_json::{json, Value};

/// One JSON object per event on stdout, in the `{"v":1,"event_type":..}` shape.
pub struct JsonlRendererPlugin {
    pretty_print: bool,
}

impl JsonlRendererPlugin {
    pub fn new(pretty_print: bool) -> Self {
        Self { pretty_print }
    }

    fn event_type(event: &RunEvent) -> &'static str {
        match event {
            RunEvent::Creating => "run.start",
            RunEvent::TaskListCreated { .. } => "executor.plan",
            RunEvent::Preparing => "round.prepare",
            RunEvent::Executing { .. } => "round.start",
            RunEvent::UserInput { .. } => "task.input",
            RunEvent::TaskCompleted { .. } => "task.end",
            RunEvent::Failed { .. } => "run.error",
            RunEvent::Finished { .. } => "run.end",
        }
    }

    fn event_to_json(&self, envelope: &EventEnvelope) -> Value {
        let mut value = json!({
            "v": 1,
            "event_type": Self::event_type(&envelope.event),
            "ts": envelope.ts.to_rfc3339(),
            "run_id": envelope.run_id,
        });

        let metadata = match &envelope.event {
            RunEvent::Creating | RunEvent::Preparing => None,
            RunEvent::TaskListCreated { tasks } => Some(json!({
                "total_tasks": tasks.len(),
                "tasks": tasks,
            })),
            RunEvent::Executing { running_ids, total } => Some(json!({
                "tasks": running_ids,
                "total_tasks": total,
            })),
            RunEvent::UserInput { task_id, question } => {
                value["task_id"] = json!(task_id);
                Some(json!({ "question": question }))
            }
            RunEvent::TaskCompleted {
                task_id,
                outcome,
                output,
                duration_ms,
            } => {
                value["task_id"] = json!(task_id);
                Some(json!({
                    "outcome": outcome,
                    "success": outcome.is_success(),
                    "output": output,
                    "duration_ms": duration_ms,
                }))
            }
            RunEvent::Failed { reason } => Some(json!({ "reason": reason })),
            RunEvent::Finished { status } => Some(json!({ "status": status })),
        };
        if let Some(metadata) = metadata {
            value["metadata"] = metadata;
        }
        value
    }
}

impl OutputRendererPlugin for JsonlRendererPlugin {
    fn name(&self) -> &str {
        "jsonl-renderer"
    }

    fn format(&self) -> &str {
        "jsonl"
    }

    fn render(&self, envelope: &EventEnvelope) {
        let value = self.event_to_json(envelope);
        if self.pretty_print {
            println!("{}", serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".into()));
        } else {
            println!("{}", serde_json::to_string(&value).unwrap_or_else(|_| "{}".into()));
        }
    }
}

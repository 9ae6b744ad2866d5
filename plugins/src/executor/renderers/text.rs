use std::collections::HashMap;
use std::sync::Mutex;

use taskmesh_core::api::{
    EventEnvelope, OutputRendererPlugin, ProgressMonitor, RunEvent, RunStatus, TaskId, TaskOutcome,
};

const OUTPUT_PREVIEW_CHARS: usize = 400;

struct TextState {
    progress: ProgressMonitor,
    labels: HashMap<TaskId, String>,
}

/// Human-readable run log on stdout, with optional indicatif spinners.
pub struct TextRendererPlugin {
    ascii_only: bool,
    state: Mutex<TextState>,
}

impl TextRendererPlugin {
    pub fn new(ascii_only: bool, progress: bool) -> Self {
        Self {
            ascii_only,
            state: Mutex::new(TextState {
                progress: ProgressMonitor::new(progress, ascii_only),
                labels: HashMap::new(),
            }),
        }
    }

    fn outcome_label(&self, outcome: &TaskOutcome) -> String {
        match (outcome, self.ascii_only) {
            (TaskOutcome::Succeeded, true) => "OK".to_string(),
            (TaskOutcome::Succeeded, false) => "SUCCESS".to_string(),
            (TaskOutcome::Failed { reason }, true) => format!("FAIL: {reason}"),
            (TaskOutcome::Failed { reason }, false) => format!("FAILED: {reason}"),
            (TaskOutcome::Cancelled, _) => "CANCELLED".to_string(),
        }
    }

    fn format_event(&self, envelope: &EventEnvelope) -> Option<String> {
        let run_id = &envelope.run_id;
        let line = match &envelope.event {
            RunEvent::Creating => format!("RUN START {run_id}: creating tasks"),
            RunEvent::TaskListCreated { tasks } => {
                let mut out = format!("TASK LIST {run_id} ({} tasks):", tasks.len());
                for task in tasks {
                    out.push_str(&format!("\n  #{} [{}] {}", task.id, task.tool, task.description));
                    if !task.dependent_task_ids.is_empty() {
                        let deps: Vec<String> =
                            task.dependent_task_ids.iter().map(|d| d.to_string()).collect();
                        out.push_str(&format!(" (after {})", deps.join(", ")));
                    }
                }
                out
            }
            // Emitted every round; too noisy for the log.
            RunEvent::Preparing => return None,
            RunEvent::Executing { running_ids, total } => {
                let ids: Vec<String> = running_ids.iter().map(|id| format!("#{id}")).collect();
                format!("ROUND {run_id}: running {} ({} tasks total)", ids.join(" "), total)
            }
            RunEvent::UserInput { task_id, question } => {
                format!("INPUT NEEDED (task #{task_id}): {question}")
            }
            RunEvent::TaskCompleted {
                task_id,
                outcome,
                output,
                duration_ms,
            } => {
                let mut line = format!(
                    "TASK END #{task_id} ({}, {duration_ms}ms)",
                    self.outcome_label(outcome)
                );
                let output = output.trim();
                if !output.is_empty() {
                    line.push('\n');
                    line.push_str(&preview(output));
                }
                line
            }
            RunEvent::Failed { reason } => format!("RUN FAILED {run_id}: {reason}"),
            RunEvent::Finished { status } => match status {
                RunStatus::Stalled { blocked } => {
                    format!("RUN END {run_id} (stalled, blocked {:?})", blocked)
                }
                other => format!("RUN END {run_id} ({})", other.as_str()),
            },
        };
        Some(line)
    }

    fn track(&self, state: &mut TextState, event: &RunEvent) {
        match event {
            RunEvent::TaskListCreated { tasks } => {
                state.progress.set_total(tasks.len());
                state.progress.set_message("Running tasks...");
                state.labels = tasks
                    .iter()
                    .map(|t| (t.id, truncate_chars(&t.description, 60)))
                    .collect();
            }
            RunEvent::Executing { running_ids, .. } => {
                for id in running_ids {
                    let label = state.labels.get(id).cloned().unwrap_or_default();
                    state.progress.add_task(*id, &label);
                }
            }
            RunEvent::UserInput { task_id, .. } => state.progress.waiting_for_input(*task_id),
            RunEvent::TaskCompleted {
                task_id,
                outcome,
                duration_ms,
                ..
            } => state.progress.complete_task(*task_id, outcome, *duration_ms),
            RunEvent::Finished { status } => {
                state.progress.finish(matches!(status, RunStatus::Finished))
            }
            _ => {}
        }
    }
}

impl OutputRendererPlugin for TextRendererPlugin {
    fn name(&self) -> &str {
        "text-renderer"
    }

    fn format(&self) -> &str {
        "text"
    }

    fn render(&self, envelope: &EventEnvelope) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        self.track(&mut state, &envelope.event);
        if let Some(line) = self.format_event(envelope) {
            if !state.progress.println(&line) {
                println!("{}", line);
            }
        }
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    let mut out: String = s.chars().take(max).collect();
    if s.chars().nth(max).is_some() {
        out.push_str("...");
    }
    out
}

fn preview(output: &str) -> String {
    truncate_chars(output, OUTPUT_PREVIEW_CHARS)
        .lines()
        .map(|l| format!("  | {l}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use taskmesh_core::api::{Task, Tool};

    fn envelope(event: RunEvent) -> EventEnvelope {
        EventEnvelope {
            run_id: "run".to_string(),
            ts: Utc::now(),
            event,
        }
    }

    #[test]
    fn test_text_renderer_task_complete() {
        let renderer = TextRendererPlugin::new(true, false);
        let line = renderer
            .format_event(&envelope(RunEvent::TaskCompleted {
                task_id: 3,
                outcome: TaskOutcome::Failed {
                    reason: "timeout".into(),
                },
                output: String::new(),
                duration_ms: 5,
            }))
            .unwrap();

        assert_eq!(line, "TASK END #3 (FAIL: timeout, 5ms)");
    }

    #[test]
    fn test_text_renderer_task_list_and_preview() {
        let renderer = TextRendererPlugin::new(false, false);
        let tasks = vec![
            Task::new(1, "Search news", Tool::WebSearch),
            Task::new(2, "Summarize", Tool::TextCompletion).with_dependencies([1]),
        ];
        let line = renderer
            .format_event(&envelope(RunEvent::TaskListCreated { tasks }))
            .unwrap();
        assert!(line.contains("#1 [web-search] Search news"));
        assert!(line.contains("#2 [text-completion] Summarize (after 1)"));

        let line = renderer
            .format_event(&envelope(RunEvent::TaskCompleted {
                task_id: 2,
                outcome: TaskOutcome::Succeeded,
                output: "line one\nline two".into(),
                duration_ms: 9,
            }))
            .unwrap();
        assert!(line.ends_with("  | line one\n  | line two"));
    }

    #[test]
    fn test_preparing_is_silent() {
        let renderer = TextRendererPlugin::new(false, false);
        assert!(renderer.format_event(&envelope(RunEvent::Preparing)).is_none());
        renderer.render(&envelope(RunEvent::Preparing));
    }
}

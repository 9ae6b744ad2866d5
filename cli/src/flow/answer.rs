//! Answers `user-input` questions from a line-oriented reader (stdin in the
//! binary). A plain line answers the oldest open question; `#<id> text`
//! answers a specific task.
use std::collections::VecDeque;

use taskmesh_core::api::{EventEnvelope, RunController, RunEvent, TaskId};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::broadcast::{self, error::RecvError};

/// Split `#<id> text` into its target and answer; anything else targets the
/// oldest question.
pub fn parse_answer(line: &str) -> (Option<TaskId>, String) {
    let line = line.trim_end_matches(['\r', '\n']);
    if let Some(rest) = line.strip_prefix('#') {
        let (id, text) = rest.split_once(' ').unwrap_or((rest, ""));
        if let Ok(id) = id.parse::<TaskId>() {
            return (Some(id), text.trim().to_string());
        }
    }
    (None, line.trim().to_string())
}

fn prompt_for(id: TaskId, question: &str) {
    eprintln!("? [#{id}] {question}");
    eprint!("> ");
}

/// Runs until the run finishes or the event stream closes. On EOF every open
/// question is answered with an empty string so the run can drain.
pub async fn answer_questions<R>(
    controller: RunController,
    mut events: broadcast::Receiver<EventEnvelope>,
    reader: R,
    interactive: bool,
) where
    R: AsyncBufRead + Unpin,
{
    let mut open: VecDeque<(TaskId, String)> = VecDeque::new();
    let mut lines = reader.lines();
    let mut eof = false;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(envelope) => match envelope.event {
                    RunEvent::UserInput { task_id, question } => {
                        // already answered by a targeted line
                        if !controller.pending_user_inputs().contains(&task_id) {
                            continue;
                        }
                        if eof {
                            controller.resolve_user_input(task_id, "");
                            continue;
                        }
                        if interactive && open.is_empty() {
                            prompt_for(task_id, &question);
                        }
                        open.push_back((task_id, question));
                    }
                    RunEvent::Finished { .. } => break,
                    _ => {}
                },
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "answer loop lagged behind run events");
                }
                Err(RecvError::Closed) => break,
            },
            line = lines.next_line(), if !open.is_empty() && !eof => match line {
                Ok(Some(line)) => {
                    let (target, text) = parse_answer(&line);
                    let id = match target {
                        Some(id) => id,
                        None => match open.front() {
                            Some((id, _)) => *id,
                            None => continue,
                        },
                    };
                    if controller.resolve_user_input(id, text) {
                        open.retain(|(open_id, _)| *open_id != id);
                    } else {
                        eprintln!("no open question for task #{id}");
                    }
                    if interactive {
                        if let Some((next, question)) = open.front() {
                            prompt_for(*next, question);
                        }
                    }
                }
                Ok(None) | Err(_) => {
                    tracing::warn!(open = open.len(), "input closed; answering open questions with empty text");
                    eof = true;
                    for (id, _) in open.drain(..) {
                        controller.resolve_user_input(id, "");
                    }
                }
            },
        }
    }
}

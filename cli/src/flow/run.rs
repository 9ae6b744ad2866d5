//! Drives one objective: Ctrl-C cancels, stdin answers questions, the final
//! report goes to stdout (and optionally a file).
use std::path::PathBuf;

use serde_json::json;
use taskmesh_core::api as core_api;
use tokio::io::BufReader;

use super::answer::answer_questions;

pub struct RunOptions {
    pub objective: String,
    pub model: String,
    pub language: String,
    pub format: core_api::OutputFormat,
    pub report_path: Option<PathBuf>,
}

/// 0 finished, 20 task creation failed, 50 stalled, 130 cancelled.
pub fn exit_code_for_status(status: &core_api::RunStatus) -> i32 {
    match status {
        core_api::RunStatus::Finished => 0,
        core_api::RunStatus::CreationFailed { .. } => 20,
        core_api::RunStatus::Stalled { .. } => 50,
        core_api::RunStatus::Cancelled => 130,
    }
}

fn spawn_interrupt_watcher(controller: core_api::RunController) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interrupts = 0u32;
        while tokio::signal::ctrl_c().await.is_ok() {
            interrupts += 1;
            if interrupts > 1 {
                eprintln!("interrupted again; exiting");
                std::process::exit(130);
            }
            if controller.cancel() {
                eprintln!("cancelling run (press Ctrl-C again to exit immediately)");
            }
        }
    })
}

pub fn render_report(report: &core_api::RunReport, format: core_api::OutputFormat) -> String {
    match format {
        core_api::OutputFormat::Text => {
            let mut out = format!(
                "\n==== {} ({} of {} tasks complete, {} failed, {}ms) ====\n\n",
                report.status.as_str(),
                report.completed(),
                report.tasks.len(),
                report.failed(),
                report.duration_ms
            );
            out.push_str(report.session_summary().trim_end());
            out
        }
        core_api::OutputFormat::Jsonl => json!({
            "v": 1,
            "event_type": "run.report",
            "ts": report.finished_at.to_rfc3339(),
            "run_id": report.run_id,
            "metadata": report,
        })
        .to_string(),
    }
}

#[tracing::instrument(name = "cli.run_objective", skip_all)]
pub async fn run_objective(
    controller: core_api::RunController,
    opts: RunOptions,
) -> Result<i32, core_api::CliError> {
    let answers = tokio::spawn(answer_questions(
        controller.clone(),
        controller.subscribe(),
        BufReader::new(tokio::io::stdin()),
        atty::is(atty::Stream::Stdin),
    ));
    let interrupts = spawn_interrupt_watcher(controller.clone());

    let result = controller
        .start(opts.objective, &opts.model, opts.language)
        .await;
    interrupts.abort();
    answers.abort();
    let report = result?;

    println!("{}", render_report(&report, opts.format));

    if let Some(path) = &opts.report_path {
        let body = serde_json::to_string_pretty(&report)
            .map_err(|e| core_api::CliError::Command(format!("serialize report: {e}")))?;
        std::fs::write(path, body)?;
        tracing::info!(path = %path.display(), "run report written");
    }

    Ok(exit_code_for_status(&report.status))
}

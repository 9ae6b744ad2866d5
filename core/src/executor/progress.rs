use std::collections::HashMap;
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use super::types::{TaskId, TaskOutcome};

/// Glyphs for spinners and status markers.
#[derive(Debug, PartialEq, Eq)]
struct Icons {
    spinner: &'static [&'static str],
    bar_chars: &'static str,
    running: &'static str,
    waiting: &'static str,
    succeeded: &'static str,
    failed: &'static str,
    cancelled: &'static str,
}

const UNICODE_ICONS: Icons = Icons {
    spinner: &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"],
    bar_chars: "█▓▒░  ",
    running: "⏳",
    waiting: "✋",
    succeeded: "✅",
    failed: "❌",
    cancelled: "⏹",
};

const ASCII_ICONS: Icons = Icons {
    spinner: &["|", "/", "-", "\\"],
    bar_chars: "#>-",
    running: "..",
    waiting: "??",
    succeeded: "ok",
    failed: "!!",
    cancelled: "--",
};

impl Icons {
    fn pick(ascii: bool) -> &'static Icons {
        if ascii {
            &ASCII_ICONS
        } else {
            &UNICODE_ICONS
        }
    }

    fn outcome(&self, outcome: &TaskOutcome) -> &'static str {
        match outcome {
            TaskOutcome::Succeeded => self.succeeded,
            TaskOutcome::Failed { .. } => self.failed,
            TaskOutcome::Cancelled => self.cancelled,
        }
    }
}

/// Visual progress monitor for a run
///
/// One overall bar (completed / total tasks) plus a spinner per running task.
pub struct ProgressMonitor {
    multi: MultiProgress,
    overall: ProgressBar,
    task_bars: HashMap<TaskId, ProgressBar>,
    icons: &'static Icons,
    /// Disabled for jsonl output and non-tty stderr
    enabled: bool,
}

impl ProgressMonitor {
    /// The total is usually unknown until the task list exists; see `set_total`.
    /// `ascii` swaps every glyph for plain ASCII.
    pub fn new(enabled: bool, ascii: bool) -> Self {
        let icons = Icons::pick(ascii);
        if !enabled {
            return Self {
                multi: MultiProgress::new(),
                overall: ProgressBar::hidden(),
                task_bars: HashMap::new(),
                icons,
                enabled: false,
            };
        }

        let multi = MultiProgress::new();
        let overall = multi.add(ProgressBar::new(0));
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} tasks ({percent}%) {msg}")
        {
            overall.set_style(style.progress_chars(icons.bar_chars));
        }
        overall.set_message("Creating tasks...");

        Self {
            multi,
            overall,
            task_bars: HashMap::new(),
            icons,
            enabled: true,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_total(&self, total: usize) {
        if self.enabled {
            self.overall.set_length(total as u64);
        }
    }

    /// Add a running task and create its spinner
    pub fn add_task(&mut self, task_id: TaskId, label: &str) {
        if !self.enabled || self.task_bars.contains_key(&task_id) {
            return;
        }

        let bar = self.multi.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::default_spinner().template("  {spinner:.green} {msg}") {
            bar.set_style(style.tick_strings(self.icons.spinner));
        }
        bar.set_message(format!("{} #{} {}", self.icons.running, task_id, label));
        bar.enable_steady_tick(Duration::from_millis(100));

        self.task_bars.insert(task_id, bar);
    }

    /// Switch a spinner to the "waiting for you" state
    pub fn waiting_for_input(&self, task_id: TaskId) {
        if let Some(bar) = self.task_bars.get(&task_id) {
            bar.set_message(format!("{} #{} waiting for input", self.icons.waiting, task_id));
        }
    }

    pub fn complete_task(&mut self, task_id: TaskId, outcome: &TaskOutcome, duration_ms: u64) {
        if !self.enabled {
            return;
        }

        if let Some(bar) = self.task_bars.remove(&task_id) {
            let icon = self.icons.outcome(outcome);
            bar.finish_with_message(format!("{} #{} ({}ms)", icon, task_id, duration_ms));
        }

        self.overall.inc(1);
    }

    pub fn set_message(&self, msg: &str) {
        if self.enabled {
            self.overall.set_message(msg.to_string());
        }
    }

    /// Println above the bars so output does not tear them
    pub fn println(&self, line: &str) -> bool {
        if !self.enabled {
            return false;
        }
        self.multi.println(line).is_ok()
    }

    pub fn finish(&self, success: bool) {
        if !self.enabled {
            return;
        }

        let msg = if success {
            format!("{} All tasks completed", self.icons.succeeded)
        } else {
            format!("{} Run did not finish", self.icons.failed)
        };

        self.overall.finish_with_message(msg);
    }
}

impl Drop for ProgressMonitor {
    fn drop(&mut self) {
        for (_, bar) in self.task_bars.drain() {
            bar.finish_and_clear();
        }
    }
}

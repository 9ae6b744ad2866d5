//! CLI assembly: load config, apply flag overrides, build services and the
//! run controller, then hand off to the run flow.
use std::path::Path;
use std::sync::Arc;

use taskmesh_core::api as core_api;
use taskmesh_plugins::factory;
use taskmesh_plugins::services::PluginServicesFactory;

use crate::commands::cli::{FormatArg, RunArgs, StallArg};
use crate::flow::run::{run_objective, RunOptions};

pub fn load_config(path: Option<&Path>) -> Result<core_api::AppConfig, core_api::CliError> {
    let loaded = match path {
        Some(path) => core_api::load_from_path(path),
        None => core_api::load_default(),
    };
    loaded.map_err(|e| core_api::CliError::Config(format!("{e:#}")))
}

/// Flags win over file and environment settings.
pub fn apply_run_overrides(cfg: &mut core_api::AppConfig, args: &RunArgs) {
    if let Some(model) = args.model.as_deref().filter(|m| !m.trim().is_empty()) {
        cfg.llm.model = model.to_string();
    }
    if let Some(language) = args.language.as_deref().filter(|l| !l.trim().is_empty()) {
        cfg.executor.default_language = language.to_string();
    }
    if let Some(format) = args.format {
        cfg.output.format = match format {
            FormatArg::Text => core_api::OutputFormat::Text,
            FormatArg::Jsonl => core_api::OutputFormat::Jsonl,
        };
    }
    if let Some(max_batch) = args.max_batch {
        cfg.executor.max_batch_size = max_batch.max(1);
    }
    if let Some(policy) = args.stall_policy {
        cfg.executor.stall_policy = match policy {
            StallArg::Wait => core_api::StallPolicy::Wait,
            StallArg::Finish => core_api::StallPolicy::Finish,
        };
    }
    if args.no_progress {
        cfg.output.progress_bar = false;
    }
    if args.ascii {
        cfg.output.ascii = true;
    }
}

fn read_objective(args: &RunArgs) -> Result<String, core_api::CliError> {
    let objective = match (&args.objective, &args.objective_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)?,
        (None, None) => {
            return Err(core_api::CliError::Command(
                "an objective is required (positional or --objective-file)".to_string(),
            ))
        }
    };
    let objective = objective.trim().to_string();
    if objective.is_empty() {
        return Err(core_api::CliError::Command("objective is empty".to_string()));
    }
    Ok(objective)
}

#[tracing::instrument(name = "cli.run_app", skip_all)]
pub async fn run_app(
    mut cfg: core_api::AppConfig,
    args: RunArgs,
) -> Result<i32, core_api::CliError> {
    apply_run_overrides(&mut cfg, &args);
    let objective = read_objective(&args)?;

    let services = core_api::ServicesFactory::build_services(&PluginServicesFactory, &cfg).await?;

    let progress = cfg.output.progress_bar
        && cfg.output.format == core_api::OutputFormat::Text
        && atty::is(atty::Stream::Stderr);
    let renderer = factory::build_renderer(cfg.output.format, cfg.output.ascii, progress);

    let controller = core_api::RunController::builder(services)
        .config(cfg.executor.clone())
        .renderer(Arc::clone(&renderer))
        .build();

    tracing::debug!(
        model = %cfg.llm.model,
        language = %cfg.executor.default_language,
        format = renderer.format(),
        "run configured"
    );

    run_objective(
        controller,
        RunOptions {
            objective,
            model: cfg.llm.model.clone(),
            language: cfg.executor.default_language.clone(),
            format: cfg.output.format,
            report_path: args.report.clone(),
        },
    )
    .await
}

/// `taskmesh tools`: what the task creator will be offered.
pub fn describe_tools(cfg: &core_api::AppConfig) -> String {
    let offer = factory::tool_offer(cfg);
    let mut out = String::new();
    let mut line = |name: &str, enabled: bool, hint: &str| {
        let state = if enabled { "enabled" } else { "disabled" };
        out.push_str(&format!("{name:<16} {state:<9} {hint}\n"));
    };
    line(core_api::TOOL_TEXT_COMPLETION, true, &cfg.llm.model);
    line(
        core_api::TOOL_WEB_SEARCH,
        offer.web_search,
        "set SERP_API_KEY or GOOGLE_SEARCH_API_KEY + GOOGLE_SEARCH_ENGINE_ID",
    );
    line(core_api::TOOL_USER_INPUT, offer.user_input, "answers are read from stdin");
    line(core_api::TOOL_GITHUB, offer.github, "set GITHUB_TOKEN");
    if offer.github {
        out.push_str(&format!(
            "\ngithub actions: {}\n",
            taskmesh_plugins::github::action_names().join(", ")
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cli::{Args, Commands};
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn run_args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["taskmesh", "run"];
        full.extend_from_slice(argv);
        match Args::parse_from(full).command {
            Commands::Run(run) => run,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_flags_override_config() {
        let mut cfg = core_api::AppConfig::default();
        let args = run_args(&[
            "x",
            "--model",
            "local",
            "--language",
            "German",
            "--max-batch",
            "0",
            "--stall-policy",
            "finish",
            "--no-progress",
        ]);
        apply_run_overrides(&mut cfg, &args);

        assert_eq!(cfg.llm.model, "local");
        assert_eq!(cfg.executor.default_language, "German");
        assert_eq!(cfg.executor.max_batch_size, 1);
        assert_eq!(cfg.executor.stall_policy, core_api::StallPolicy::Finish);
        assert!(!cfg.output.progress_bar);
    }

    #[test]
    fn test_objective_from_file_is_trimmed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  plan a trip to Kyoto  ").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let args = run_args(&["--objective-file", &path]);
        assert_eq!(read_objective(&args).unwrap(), "plan a trip to Kyoto");

        let args = run_args(&["   "]);
        assert!(read_objective(&args).is_err());
    }

    #[test]
    fn test_describe_tools_lists_disabled_collaborators() {
        let text = describe_tools(&core_api::AppConfig::default());
        assert!(text.contains("web-search       disabled"));
        assert!(text.contains("user-input       enabled"));
        assert!(!text.contains("github actions"));
    }
}

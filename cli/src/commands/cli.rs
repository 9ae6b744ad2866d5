use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Text,
    Jsonl,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StallArg {
    Wait,
    Finish,
}

#[derive(Parser, Debug)]
#[command(name = "taskmesh", version, about = "Break an objective into tasks and run them")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file; defaults to ~/.taskmesh/config.toml, then ./config.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// The objective to pursue.
    #[arg(group = "input")]
    pub objective: Option<String>,

    #[arg(long, group = "input")]
    pub objective_file: Option<PathBuf>,

    /// Overrides `llm.model`.
    #[arg(long)]
    pub model: Option<String>,

    /// Language task descriptions and answers are written in.
    #[arg(long)]
    pub language: Option<String>,

    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,

    /// Maximum tasks dispatched per round.
    #[arg(long)]
    pub max_batch: Option<usize>,

    /// What to do when tasks remain but none can start.
    #[arg(long, value_enum)]
    pub stall_policy: Option<StallArg>,

    #[arg(long)]
    pub no_progress: bool,

    #[arg(long)]
    pub ascii: bool,

    /// Write the final run report as JSON to this path.
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one objective to completion.
    Run(RunArgs),
    /// Show which tools the current configuration enables.
    Tools,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_run_flags() {
        let args = Args::parse_from([
            "taskmesh",
            "run",
            "write a poem",
            "--model",
            "gpt-4o",
            "--format",
            "jsonl",
            "--max-batch",
            "2",
            "--stall-policy",
            "finish",
        ]);
        let Commands::Run(run) = args.command else {
            panic!("expected run");
        };
        assert_eq!(run.objective.as_deref(), Some("write a poem"));
        assert_eq!(run.model.as_deref(), Some("gpt-4o"));
        assert_eq!(run.format, Some(FormatArg::Jsonl));
        assert_eq!(run.max_batch, Some(2));
        assert_eq!(run.stall_policy, Some(StallArg::Finish));
    }

    #[test]
    fn test_objective_sources_conflict() {
        let res = Args::try_parse_from([
            "taskmesh",
            "run",
            "inline",
            "--objective-file",
            "obj.txt",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let args = Args::parse_from(["taskmesh", "tools", "--config", "/tmp/c.toml"]);
        assert!(matches!(args.command, Commands::Tools));
        assert_eq!(args.config, Some(PathBuf::from("/tmp/c.toml")));
    }
}

use thiserror::Error;

use super::executor::ExecutorError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("runner failed: {0}")]
    Runner(#[from] RunnerError),
    #[error("executor failed: {0}")]
    Executor(#[from] ExecutorError),
    #[error("command failed: {0}")]
    Command(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("config error: {0}")]
    Config(String),
    #[error("plugin error: {0}")]
    Plugin(#[from] anyhow::Error),
}

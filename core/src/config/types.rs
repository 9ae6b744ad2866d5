use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default = "default_logging_file")]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "taskmesh_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    true
}

fn default_logging_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

/// OpenAI-compatible chat completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_llm_timeout_ms")]
    pub timeout_ms: u64,

    /// Extra attempts on 429/5xx/connect errors.
    #[serde(default = "default_llm_max_retries")]
    pub max_retries: u32,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_max_tokens() -> u32 {
    1500
}

fn default_llm_timeout_ms() -> u64 {
    120_000
}

fn default_llm_max_retries() -> u32 {
    3
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            api_key: String::new(),
            model: default_llm_model(),
            temperature: 0.0,
            max_tokens: default_llm_max_tokens(),
            timeout_ms: default_llm_timeout_ms(),
            max_retries: default_llm_max_retries(),
        }
    }
}

/// What the loop does when incomplete tasks remain but none is ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StallPolicy {
    /// Block until the run is cancelled; a stall after a joined round is permanent.
    #[default]
    Wait,
    /// End the run with a stalled status.
    Finish,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Maximum number of tasks dispatched in one round.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Character cap on the dependency context handed to text generation.
    #[serde(default = "default_dependency_context_limit")]
    pub dependency_context_limit: usize,

    #[serde(default)]
    pub stall_policy: StallPolicy,

    #[serde(default = "default_language")]
    pub default_language: String,
}

fn default_max_batch_size() -> usize {
    5
}

fn default_dependency_context_limit() -> usize {
    14_000
}

fn default_language() -> String {
    "English".to_string()
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            dependency_context_limit: default_dependency_context_limit(),
            stall_policy: StallPolicy::default(),
            default_language: default_language(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchProvider {
    #[default]
    SerpApi,
    Google,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub provider: SearchProvider,

    /// When unset, `web-search` is not offered to the task creator.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Google Custom Search engine id (`cx`).
    #[serde(default)]
    pub engine_id: Option<String>,

    #[serde(default = "default_search_max_results")]
    pub max_results: usize,

    /// Overrides the provider endpoint; mostly for local proxies.
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_search_max_results() -> usize {
    5
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: SearchProvider::default(),
            api_key: None,
            engine_id: None,
            max_results: default_search_max_results(),
            base_url: None,
        }
    }
}

impl SearchConfig {
    pub fn is_enabled(&self) -> bool {
        let has_key = self
            .api_key
            .as_deref()
            .map(|k| !k.trim().is_empty())
            .unwrap_or(false);
        match self.provider {
            SearchProvider::SerpApi => has_key,
            SearchProvider::Google => has_key && self.engine_id.is_some(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// When unset, `github-tool` is not offered to the task creator.
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_github_api_base")]
    pub api_base: String,

    #[serde(default = "default_github_user_agent")]
    pub user_agent: String,
}

fn default_github_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_github_user_agent() -> String {
    "taskmesh".to_string()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_base: default_github_api_base(),
            user_agent: default_github_user_agent(),
        }
    }
}

impl GitHubConfig {
    pub fn is_enabled(&self) -> bool {
        self.token
            .as_deref()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Jsonl,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Per-task spinners on stderr (text format only).
    #[serde(default = "default_progress_bar")]
    pub progress_bar: bool,

    #[serde(default)]
    pub ascii: bool,
}

fn default_progress_bar() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            progress_bar: default_progress_bar(),
            ascii: false,
        }
    }
}

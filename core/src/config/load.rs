use std::path::{Path, PathBuf};

use anyhow::Context;

use super::types::AppConfig;

/// Get the default taskmesh data directory: ~/.taskmesh
pub fn get_data_dir() -> anyhow::Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home.join(".taskmesh"))
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.taskmesh/config.toml (highest)
    let data_dir = get_data_dir()?;
    let home_config = data_dir.join("config.toml");

    // Priority 2: ./config.toml (current directory)
    let local_config = Path::new("config.toml");

    let cfg = if home_config.exists() {
        read_config(&home_config)?
    } else if local_config.exists() {
        read_config(local_config)?
    } else {
        AppConfig::default()
    };

    finish(cfg, &data_dir)
}

/// Load an explicit config file, still applying env overrides.
pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let cfg = read_config(path)?;
    finish(cfg, &get_data_dir()?)
}

fn read_config(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    toml::from_str::<AppConfig>(&s).with_context(|| format!("parse config {}", path.display()))
}

fn finish(mut cfg: AppConfig, data_dir: &Path) -> anyhow::Result<AppConfig> {
    // Update logging directory to use the data directory if not set
    if cfg.logging.file
        && cfg
            .logging
            .directory
            .as_deref()
            .map(|s| s.trim().is_empty())
            .unwrap_or(true)
    {
        let logs_dir = data_dir.join("logs");
        std::fs::create_dir_all(&logs_dir)?;
        cfg.logging.directory = Some(logs_dir.to_string_lossy().to_string());
    }

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok());
    Ok(cfg)
}

/// Environment variable overrides (Priority 0: highest after CLI flags).
pub fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("TASKMESH_LLM_BASE_URL") {
        cfg.llm.base_url = v;
    }
    if let Some(v) = get("TASKMESH_LLM_API_KEY").or_else(|| get("OPENAI_API_KEY")) {
        cfg.llm.api_key = v;
    }
    if let Some(v) = get("TASKMESH_MODEL") {
        cfg.llm.model = v;
    }
    if let Some(v) = get("SERP_API_KEY") {
        cfg.search.provider = super::types::SearchProvider::SerpApi;
        cfg.search.api_key = Some(v);
    } else if let Some(v) = get("GOOGLE_SEARCH_API_KEY") {
        cfg.search.provider = super::types::SearchProvider::Google;
        cfg.search.api_key = Some(v);
        if let Some(cx) = get("GOOGLE_SEARCH_ENGINE_ID") {
            cfg.search.engine_id = Some(cx);
        }
    }
    if let Some(v) = get("GITHUB_TOKEN") {
        cfg.github.token = Some(v);
    }
}

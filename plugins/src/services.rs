//! ServicesFactory implementation: builds the LLM-backed collaborators from
//! config so the CLI only deals with `Services`.
use async_trait::async_trait;
use taskmesh_core::api::{AppConfig, RunnerError, Services, ServicesFactory};

use crate::factory;

pub struct PluginServicesFactory;

/// Settings every run depends on; a bad value here is a config error, not a plugin failure.
fn check_llm_config(cfg: &AppConfig) -> Result<(), RunnerError> {
    let base = cfg.llm.base_url.trim();
    match reqwest::Url::parse(base) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => {
            return Err(RunnerError::Config(format!(
                "llm.base_url must be an http(s) url, got {base:?}"
            )))
        }
    }
    if cfg.llm.model.trim().is_empty() {
        return Err(RunnerError::Config("llm.model is empty".to_string()));
    }
    Ok(())
}

impl Default for PluginServicesFactory {
    fn default() -> Self {
        Self
    }
}

#[async_trait]
impl ServicesFactory for PluginServicesFactory {
    async fn build_services(&self, cfg: &AppConfig) -> Result<Services, RunnerError> {
        check_llm_config(cfg)?;
        let llm = factory::build_llm(cfg).map_err(RunnerError::Plugin)?;
        let search = factory::build_search(cfg, llm.clone()).map_err(RunnerError::Plugin)?;
        let actions = factory::build_actions(cfg).map_err(RunnerError::Plugin)?;
        tracing::debug!(
            model = %llm.default_model(),
            web_search = search.is_some(),
            github = actions.is_some(),
            "services built"
        );
        Ok(Services {
            creator: factory::build_creator(cfg, llm.clone()),
            text: factory::build_text(llm),
            search,
            actions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_config_builds_core_services() {
        let services = PluginServicesFactory
            .build_services(&AppConfig::default())
            .await
            .unwrap();
        assert_eq!(services.creator.name(), "llm-planner");
        assert_eq!(services.text.name(), "llm-text");
        assert!(services.search.is_none());
        assert!(services.actions.is_none());
    }

    #[tokio::test]
    async fn test_bad_llm_settings_are_config_errors() {
        let mut cfg = AppConfig::default();
        cfg.llm.base_url = "localhost:8080/v1".into();
        let err = PluginServicesFactory.build_services(&cfg).await.err().unwrap();
        assert!(matches!(&err, RunnerError::Config(msg) if msg.contains("llm.base_url")));

        let mut cfg = AppConfig::default();
        cfg.llm.model = "  ".into();
        let err = PluginServicesFactory.build_services(&cfg).await.err().unwrap();
        assert!(matches!(err, RunnerError::Config(_)));
    }
}

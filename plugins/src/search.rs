//! `web-search`: query a search API, then have the chat model condense the
//! top results into an answer for the task.
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use taskmesh_core::api::{SearchConfig, SearchProvider, SearchRequest, WebSearcher};
use tokio_util::sync::CancellationToken;

use crate::http::{parse_json_response, HttpError};
use crate::llm::prompt;
use crate::llm::{ChatMessage, OpenAiClient};

const SERVICE: &str = "search";
const SERPAPI_URL: &str = "https://serpapi.com/search.json";
const GOOGLE_CSE_URL: &str = "https://www.googleapis.com/customsearch/v1";
const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

pub struct WebSearchTool {
    http: reqwest::Client,
    llm: Arc<OpenAiClient>,
    provider: SearchProvider,
    api_key: String,
    engine_id: Option<String>,
    endpoint: String,
    max_results: usize,
}

impl WebSearchTool {
    pub fn new(cfg: &SearchConfig, llm: Arc<OpenAiClient>) -> anyhow::Result<Self> {
        let api_key = cfg
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("search.api_key is not set"))?;
        if cfg.provider == SearchProvider::Google && cfg.engine_id.is_none() {
            anyhow::bail!("search.engine_id is required for the google provider");
        }
        let endpoint = cfg.base_url.clone().unwrap_or_else(|| match cfg.provider {
            SearchProvider::SerpApi => SERPAPI_URL.to_string(),
            SearchProvider::Google => GOOGLE_CSE_URL.to_string(),
        });
        let http = reqwest::Client::builder().timeout(SEARCH_TIMEOUT).build()?;
        Ok(Self {
            http,
            llm,
            provider: cfg.provider,
            api_key,
            engine_id: cfg.engine_id.clone(),
            endpoint,
            max_results: cfg.max_results.max(1),
        })
    }

    async fn query_for(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> anyhow::Result<String> {
        if request.dependency_context.trim().is_empty() {
            return Ok(request.query.trim().to_string());
        }
        let prompt =
            prompt::search_query(&request.objective, &request.query, &request.dependency_context);
        let query = self
            .llm
            .chat(&request.model, &[ChatMessage::user(prompt)], cancel)
            .await
            .context("search query generation failed")?;
        let query = query.trim().trim_matches('"').trim().to_string();
        if query.is_empty() {
            Ok(request.query.trim().to_string())
        } else {
            Ok(query)
        }
    }

    async fn fetch(&self, query: &str) -> anyhow::Result<Vec<SearchHit>> {
        let num = self.max_results.to_string();
        let req = match self.provider {
            SearchProvider::SerpApi => self.http.get(&self.endpoint).query(&[
                ("engine", "google"),
                ("q", query),
                ("api_key", self.api_key.as_str()),
                ("num", num.as_str()),
            ]),
            SearchProvider::Google => self.http.get(&self.endpoint).query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_deref().unwrap_or_default()),
                ("q", query),
                ("num", num.as_str()),
            ]),
        };

        let resp = req
            .send()
            .await
            .map_err(|err| HttpError::from_reqwest(SERVICE, err, self.endpoint.clone()))?;
        let value = parse_json_response(SERVICE, resp).await?;
        let mut hits = parse_hits(self.provider, &value);
        hits.truncate(self.max_results);
        Ok(hits)
    }
}

#[async_trait]
impl WebSearcher for WebSearchTool {
    fn name(&self) -> &str {
        match self.provider {
            SearchProvider::SerpApi => "serpapi",
            SearchProvider::Google => "google-cse",
        }
    }

    async fn search(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> anyhow::Result<String> {
        let query = self.query_for(request, cancel).await?;
        tracing::info!(task_id = request.task_id, query = %query, "web search");

        let hits = tokio::select! {
            biased;
            _ = cancel.cancelled() => anyhow::bail!("cancelled during web search"),
            hits = self.fetch(&query) => hits?,
        };
        if hits.is_empty() {
            tracing::warn!(task_id = request.task_id, query = %query, "web search returned no results");
            return Ok(format!("No search results for \"{query}\"."));
        }

        let snippets = format_hits(&hits);
        let prompt = prompt::search_summary(
            &request.objective,
            &request.language,
            &request.query,
            &query,
            &snippets,
        );
        self.llm
            .chat(&request.model, &[ChatMessage::user(prompt)], cancel)
            .await
            .context("search summary failed")
    }
}

fn text_field(item: &Value, key: &str) -> String {
    item.get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// SerpAPI puts hits in `organic_results`, Google CSE in `items`.
fn parse_hits(provider: SearchProvider, value: &Value) -> Vec<SearchHit> {
    let key = match provider {
        SearchProvider::SerpApi => "organic_results",
        SearchProvider::Google => "items",
    };
    value
        .get(key)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .map(|item| SearchHit {
                    title: text_field(item, "title"),
                    link: text_field(item, "link"),
                    snippet: text_field(item, "snippet"),
                })
                .filter(|hit| !hit.link.is_empty() || !hit.snippet.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn format_hits(hits: &[SearchHit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| {
            format!(
                "{}. {}\n   {}\n   {}\n",
                i + 1,
                hit.title,
                hit.link,
                hit.snippet
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use taskmesh_core::api::LlmConfig;

    fn request(context: &str) -> SearchRequest {
        SearchRequest {
            objective: "Find AI news".into(),
            model: "m".into(),
            language: "English".into(),
            task_id: 1,
            query: "AI news today".into(),
            dependency_context: context.into(),
        }
    }

    fn tool(search_url: String, llm_url: String) -> WebSearchTool {
        let llm = OpenAiClient::new(&LlmConfig {
            base_url: llm_url,
            max_retries: 0,
            ..LlmConfig::default()
        })
        .unwrap();
        let cfg = SearchConfig {
            api_key: Some("serp-key".into()),
            max_results: 2,
            base_url: Some(format!("{search_url}/search.json")),
            ..SearchConfig::default()
        };
        WebSearchTool::new(&cfg, Arc::new(llm)).unwrap()
    }

    #[test]
    fn test_parse_hits_per_provider() {
        let serp = json!({"organic_results":[{"title":"T","link":"https://a","snippet":"s"},{"title":"empty"}]});
        assert_eq!(
            parse_hits(SearchProvider::SerpApi, &serp),
            vec![SearchHit {
                title: "T".into(),
                link: "https://a".into(),
                snippet: "s".into()
            }]
        );
        let cse = json!({"items":[{"title":"G","link":"https://g","snippet":"x"}]});
        assert_eq!(parse_hits(SearchProvider::Google, &cse).len(), 1);
        assert!(parse_hits(SearchProvider::Google, &serp).is_empty());
    }

    #[test]
    fn test_google_requires_engine_id() {
        let llm = Arc::new(OpenAiClient::new(&LlmConfig::default()).unwrap());
        let cfg = SearchConfig {
            provider: SearchProvider::Google,
            api_key: Some("k".into()),
            ..SearchConfig::default()
        };
        assert!(WebSearchTool::new(&cfg, llm.clone()).is_err());
        assert!(WebSearchTool::new(&SearchConfig::default(), llm).is_err());
    }

    #[tokio::test]
    async fn test_search_then_summarize() {
        let mut search = Server::new_async().await;
        let mut llm = Server::new_async().await;

        let s = search
            .mock("GET", "/search.json")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "AI news today".into()),
                Matcher::UrlEncoded("api_key".into(), "serp-key".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"organic_results":[
                    {"title":"One","link":"https://one","snippet":"first"},
                    {"title":"Two","link":"https://two","snippet":"second"},
                    {"title":"Three","link":"https://three","snippet":"third"}
                ]})
                .to_string(),
            )
            .create_async()
            .await;
        let l = llm
            .mock("POST", "/chat/completions")
            .match_body(Matcher::Regex("https://two".into()))
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"summary"}}]}"#)
            .expect(1)
            .create_async()
            .await;

        let tool = tool(search.url(), llm.url());
        let out = tool
            .search(&request(""), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(out, "summary");
        s.assert_async().await;
        l.assert_async().await;
    }

    #[tokio::test]
    async fn test_no_results_skips_summary() {
        let mut search = Server::new_async().await;
        let mut llm = Server::new_async().await;

        search
            .mock("GET", "/search.json")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"organic_results":[]}"#)
            .create_async()
            .await;
        let l = llm
            .mock("POST", "/chat/completions")
            .expect(0)
            .create_async()
            .await;

        let out = tool(search.url(), llm.url())
            .search(&request(""), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(out, "No search results for \"AI news today\".");
        l.assert_async().await;
    }

    #[tokio::test]
    async fn test_search_error_status_surfaces() {
        let mut search = Server::new_async().await;
        let llm = Server::new_async().await;

        search
            .mock("GET", "/search.json")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body("quota exceeded")
            .create_async()
            .await;

        let err = tool(search.url(), llm.url())
            .search(&request(""), &CancellationToken::new())
            .await
            .unwrap_err();

        let http = err.downcast_ref::<HttpError>().unwrap();
        assert_eq!(http.status(), Some(403));
        assert!(err.to_string().contains("quota exceeded"));
    }
}

//! OpenAI-compatible chat completions client with retry on transient errors.
use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};
use taskmesh_core::api::LlmConfig;
use tokio_util::sync::CancellationToken;

use crate::http::{parse_json_response, HttpError};

const SERVICE: &str = "llm";

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    url_chat: String,
    default_model: String,
    temperature: f32,
    max_tokens: u32,
    max_retries: u32,
}

impl OpenAiClient {
    pub fn new(cfg: &LlmConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()?;
        Ok(Self {
            http,
            api_key: cfg.api_key.clone(),
            url_chat: format!("{}/chat/completions", cfg.base_url.trim_end_matches('/')),
            default_model: cfg.model.clone(),
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
            max_retries: cfg.max_retries,
        })
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.api_key.trim().is_empty() {
            req
        } else {
            req.bearer_auth(&self.api_key)
        }
    }

    /// Send `messages` and return the first choice's text. An empty `model`
    /// falls back to the configured default.
    pub async fn chat(
        &self,
        model: &str,
        messages: &[ChatMessage],
        cancel: &CancellationToken,
    ) -> anyhow::Result<String> {
        let model = if model.trim().is_empty() {
            self.default_model.as_str()
        } else {
            model
        };
        let body = json!({
            "model": model,
            "messages": messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        let mut attempt = 0u32;
        loop {
            match self.send_once(&body).await {
                Ok(value) => {
                    return extract_content(&value).ok_or_else(|| {
                        anyhow::anyhow!("{SERVICE} response carried no message content")
                    });
                }
                Err(err) => {
                    let transient = err
                        .downcast_ref::<HttpError>()
                        .map(HttpError::is_transient)
                        .unwrap_or(false);
                    if !transient || attempt >= self.max_retries {
                        return Err(err);
                    }
                    attempt += 1;
                    let delay = backoff(attempt);
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient llm error; retrying"
                    );
                    tokio::select! {
                        _ = cancel.cancelled() => anyhow::bail!("cancelled while waiting to retry"),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    async fn send_once(&self, body: &Value) -> anyhow::Result<Value> {
        let url = &self.url_chat;
        tracing::debug!(stage = "llm.chat.in", url = %url, model = %body["model"]);
        let req = self.http.post(url).json(body);
        let resp = self
            .auth(req)
            .send()
            .await
            .map_err(|err| HttpError::from_reqwest(SERVICE, err, url.clone()))?;
        let status = resp.status();
        let value = parse_json_response(SERVICE, resp).await?;
        tracing::debug!(stage = "llm.chat.out", status = %status);
        Ok(value)
    }
}

fn backoff(attempt: u32) -> Duration {
    let ms = 500u64.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
    Duration::from_millis(ms.min(8_000))
}

fn extract_content(v: &Value) -> Option<String> {
    // OpenAI-ish: { choices: [ { message: { content: "..." } } ] }
    if let Some(s) = v
        .get("choices")
        .and_then(|x| x.get(0))
        .and_then(|x| x.get("message"))
        .and_then(|x| x.get("content"))
        .and_then(|x| x.as_str())
    {
        return Some(s.trim().to_string());
    }
    // legacy completions
    if let Some(s) = v
        .get("choices")
        .and_then(|x| x.get(0))
        .and_then(|x| x.get("text"))
        .and_then(|x| x.as_str())
    {
        return Some(s.trim().to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use pretty_assertions::assert_eq;

    fn config(base_url: String, max_retries: u32) -> LlmConfig {
        LlmConfig {
            base_url,
            api_key: "sk-test".into(),
            model: "default-model".into(),
            timeout_ms: 2_000,
            max_retries,
            ..LlmConfig::default()
        }
    }

    #[test]
    fn test_extract_content_shapes() {
        let chat = json!({"choices":[{"message":{"role":"assistant","content":" hi \n"}}]});
        assert_eq!(extract_content(&chat).as_deref(), Some("hi"));
        let legacy = json!({"choices":[{"text":"old"}]});
        assert_eq!(extract_content(&legacy).as_deref(), Some("old"));
        assert!(extract_content(&json!({"error":"x"})).is_none());
    }

    #[test]
    fn test_backoff_is_capped() {
        assert_eq!(backoff(1), Duration::from_millis(500));
        assert_eq!(backoff(2), Duration::from_millis(1_000));
        assert_eq!(backoff(10), Duration::from_millis(8_000));
    }

    #[tokio::test]
    async fn test_chat_sends_model_and_auth() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({
                "model": "default-model",
                "messages": [{"role": "user", "content": "ping"}],
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices":[{"message":{"content":"pong"}}]}"#)
            .create_async()
            .await;

        let client = OpenAiClient::new(&config(server.url(), 0)).unwrap();
        let out = client
            .chat("", &[ChatMessage::user("ping")], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(out, "pong");
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body("bad key")
            .expect(1)
            .create_async()
            .await;

        let client = OpenAiClient::new(&config(server.url(), 3)).unwrap();
        let err = client
            .chat("m", &[ChatMessage::user("x")], &CancellationToken::new())
            .await
            .unwrap_err();

        let http = err.downcast_ref::<HttpError>().unwrap();
        assert_eq!(http.status(), Some(401));
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_is_retried() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/chat/completions")
            .with_status(503)
            .expect(2)
            .create_async()
            .await;

        let client = OpenAiClient::new(&config(server.url(), 1)).unwrap();
        let err = client
            .chat("m", &[ChatMessage::user("x")], &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("status=503"));
        m.assert_async().await;
    }
}

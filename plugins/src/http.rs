//! Shared HTTP plumbing for the network collaborators: error classification
//! and bounded body previews for diagnostics.
use serde_json::Value;
use std::{error::Error as StdError, fmt};

const BODY_PREVIEW_LIMIT: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpErrorKind {
    Timeout,
    Connect,
    Request,
    Body,
    Decode,
    Status,
    Unknown,
}

impl HttpErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Request => "request",
            Self::Body => "body",
            Self::Decode => "decode",
            Self::Status => "status",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for HttpErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct HttpError {
    service: &'static str,
    kind: HttpErrorKind,
    status: Option<u16>,
    url: Option<String>,
    message: String,
    source: Option<anyhow::Error>,
}

impl HttpError {
    pub fn kind(&self) -> HttpErrorKind {
        self.kind
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// 429 and 5xx are worth retrying; everything else is not.
    pub fn is_transient(&self) -> bool {
        match self.kind {
            HttpErrorKind::Timeout | HttpErrorKind::Connect => true,
            HttpErrorKind::Status => matches!(self.status, Some(429) | Some(500..=599)),
            _ => false,
        }
    }

    pub(crate) fn from_reqwest(service: &'static str, err: reqwest::Error, url: String) -> Self {
        let kind = if err.is_timeout() {
            HttpErrorKind::Timeout
        } else if err.is_connect() {
            HttpErrorKind::Connect
        } else if err.is_request() {
            HttpErrorKind::Request
        } else if err.is_body() {
            HttpErrorKind::Body
        } else if err.is_decode() {
            HttpErrorKind::Decode
        } else {
            HttpErrorKind::Unknown
        };
        HttpError {
            service,
            kind,
            status: err.status().map(|s| s.as_u16()),
            url: Some(url),
            message: err.to_string(),
            source: Some(anyhow::Error::new(err)),
        }
    }

    pub(crate) fn status_error(
        service: &'static str,
        status: u16,
        url: String,
        preview: String,
    ) -> Self {
        HttpError {
            service,
            kind: HttpErrorKind::Status,
            status: Some(status),
            url: Some(url),
            message: preview,
            source: None,
        }
    }

    pub(crate) fn decode_error(
        service: &'static str,
        status: u16,
        url: String,
        message: String,
    ) -> Self {
        HttpError {
            service,
            kind: HttpErrorKind::Decode,
            status: Some(status),
            url: Some(url),
            message,
            source: None,
        }
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} http error kind={}", self.service, self.kind)?;
        if let Some(status) = self.status {
            write!(f, " status={}", status)?;
        }
        if let Some(url) = &self.url {
            write!(f, " url={}", url)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl StdError for HttpError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}

pub(crate) fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    let mut out: String = trimmed.chars().take(BODY_PREVIEW_LIMIT).collect();
    if trimmed.chars().nth(BODY_PREVIEW_LIMIT).is_some() {
        out.push_str("...");
    }
    out
}

/// Read the body, fail on non-2xx, decode JSON. An empty 2xx body is `Null`.
pub(crate) async fn parse_json_response(
    service: &'static str,
    resp: reqwest::Response,
) -> anyhow::Result<Value> {
    let status = resp.status();
    let url = resp.url().to_string();
    let body = resp
        .text()
        .await
        .map_err(|err| HttpError::from_reqwest(service, err, url.clone()))?;

    if !status.is_success() {
        let preview = preview_body(&body);
        return Err(HttpError::status_error(service, status.as_u16(), url, preview).into());
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str::<Value>(&body).map_err(|err| {
        let message = format!(
            "failed to decode response body: {} | body={}",
            err,
            preview_body(&body)
        );
        HttpError::decode_error(service, status.as_u16(), url, message).into()
    })
}

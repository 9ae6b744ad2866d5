//! `github-tool`: named GitHub REST v3 actions driven by the task's `config`
//! object. Each action is a row in [`ACTIONS`]; `createBranch` and
//! `createFile` need several calls and are handled separately.
//!
//! Config values are percent-encoded into single path segments, so a value
//! cannot change which endpoint is called. `{path}` and branch names keep
//! their `/` separators.
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Url;
use serde_json::{json, Map, Value};
use taskmesh_core::api::{ExternalActions, GitHubConfig};
use tokio_util::sync::CancellationToken;

use crate::http::{parse_json_response, HttpError};

const SERVICE: &str = "github";
const API_VERSION: &str = "2022-11-28";
const GITHUB_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Get,
    Post,
    Put,
    Patch,
}

#[derive(Debug)]
struct ActionSpec {
    name: &'static str,
    method: Method,
    /// `{field}` placeholders are filled from the config and are mandatory.
    path: &'static str,
    /// Optional body fields copied when present.
    body: &'static [&'static str],
    /// Body fields that must be present.
    required: &'static [&'static str],
    /// `(query param, config field)` pairs; the field is mandatory.
    query: &'static [(&'static str, &'static str)],
}

const fn get(name: &'static str, path: &'static str) -> ActionSpec {
    ActionSpec {
        name,
        method: Method::Get,
        path,
        body: &[],
        required: &[],
        query: &[],
    }
}

const fn search(name: &'static str, path: &'static str) -> ActionSpec {
    ActionSpec {
        name,
        method: Method::Get,
        path,
        body: &[],
        required: &[],
        query: &[("q", "query")],
    }
}

const ACTIONS: &[ActionSpec] = &[
    ActionSpec {
        name: "createRepo",
        method: Method::Post,
        path: "/user/repos",
        body: &["name", "description", "private"],
        required: &["name"],
        query: &[],
    },
    get("getRepo", "/repos/{owner}/{repo}"),
    get("listRepos", "/users/{username}/repos"),
    get("listReposForOrg", "/orgs/{org}/repos"),
    get("listForks", "/repos/{owner}/{repo}/forks"),
    ActionSpec {
        name: "createIssue",
        method: Method::Post,
        path: "/repos/{owner}/{repo}/issues",
        body: &["title", "body", "labels"],
        required: &["title"],
        query: &[],
    },
    get("listIssues", "/repos/{owner}/{repo}/issues"),
    get("getIssue", "/repos/{owner}/{repo}/issues/{issue_number}"),
    get("listPullRequests", "/repos/{owner}/{repo}/pulls"),
    get("getPullRequest", "/repos/{owner}/{repo}/pulls/{pull_number}"),
    ActionSpec {
        name: "createPullRequest",
        method: Method::Post,
        path: "/repos/{owner}/{repo}/pulls",
        body: &["title", "head", "base", "body"],
        required: &["title", "head", "base"],
        query: &[],
    },
    ActionSpec {
        name: "mergePullRequest",
        method: Method::Put,
        path: "/repos/{owner}/{repo}/pulls/{pull_number}/merge",
        body: &["commit_title", "commit_message", "merge_method"],
        required: &[],
        query: &[],
    },
    get("listCommits", "/repos/{owner}/{repo}/commits"),
    get("getCommit", "/repos/{owner}/{repo}/commits/{ref}"),
    get("compareCommits", "/repos/{owner}/{repo}/compare/{base}...{head}"),
    get("getContents", "/repos/{owner}/{repo}/contents/{path}"),
    get("listFiles", "/repos/{owner}/{repo}/git/trees/{branch}?recursive=1"),
    get("listReleases", "/repos/{owner}/{repo}/releases"),
    ActionSpec {
        name: "createRelease",
        method: Method::Post,
        path: "/repos/{owner}/{repo}/releases",
        body: &["tag_name", "name", "body"],
        required: &["tag_name"],
        query: &[],
    },
    search("searchCode", "/search/code"),
    search("searchRepos", "/search/repositories"),
    search("searchIssues", "/search/issues"),
    search("searchUsers", "/search/users"),
    get("getUser", "/users/{username}"),
    get("listOrgs", "/users/{username}/orgs"),
    get("listGists", "/users/{username}/gists"),
    get("getRateLimit", "/rate_limit"),
];

const CREATE_BRANCH: &str = "createBranch";
const CREATE_FILE: &str = "createFile";
const LIST_FILES: &str = "listFiles";
const DEFAULT_BRANCH: &str = "master";

/// Names accepted by [`GitHubActions::invoke`].
pub fn action_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = ACTIONS.iter().map(|a| a.name).collect();
    names.push(CREATE_BRANCH);
    names.push(CREATE_FILE);
    names.sort_unstable();
    names
}

pub struct GitHubActions {
    http: reqwest::Client,
    token: String,
    api_base: String,
    user_agent: String,
}

impl GitHubActions {
    pub fn new(cfg: &GitHubConfig) -> anyhow::Result<Self> {
        let token = cfg
            .token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("github.token is not set"))?;
        let http = reqwest::Client::builder().timeout(GITHUB_TIMEOUT).build()?;
        Ok(Self {
            http,
            token,
            api_base: cfg.api_base.trim_end_matches('/').to_string(),
            user_agent: cfg.user_agent.clone(),
        })
    }

    fn request(&self, method: Method, url: &Url) -> reqwest::RequestBuilder {
        let req = match method {
            Method::Get => self.http.get(url.clone()),
            Method::Post => self.http.post(url.clone()),
            Method::Put => self.http.put(url.clone()),
            Method::Patch => self.http.patch(url.clone()),
        };
        req.bearer_auth(&self.token)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    async fn send(&self, req: reqwest::RequestBuilder, url: &Url) -> anyhow::Result<Value> {
        tracing::debug!(stage = "github.in", url = %url);
        let resp = req
            .send()
            .await
            .map_err(|err| HttpError::from_reqwest(SERVICE, err, url.to_string()))?;
        parse_json_response(SERVICE, resp).await
    }

    async fn run_spec(&self, spec: &ActionSpec, config: &Map<String, Value>) -> anyhow::Result<Value> {
        let url = build_url(&self.api_base, spec.path, config)?;
        let mut req = self.request(spec.method, &url);

        if !spec.query.is_empty() {
            let mut pairs = Vec::with_capacity(spec.query.len());
            for (param, field) in spec.query {
                pairs.push((*param, require(config, field)?));
            }
            req = req.query(&pairs);
        }

        if spec.method != Method::Get {
            let mut body = Map::new();
            for field in spec.required {
                if lookup(config, field).is_none() {
                    anyhow::bail!("{} requires config field `{}`", spec.name, field);
                }
            }
            for field in spec.body {
                if let Some(value) = lookup(config, field) {
                    body.insert((*field).to_string(), value.clone());
                }
            }
            req = req.json(&Value::Object(body));
        }

        self.send(req, &url).await
    }

    /// `/repos/{owner}/{repo}` followed by `tail`.
    fn repo_url(&self, config: &Map<String, Value>, tail: &[&str]) -> anyhow::Result<Url> {
        let mut url = build_url(&self.api_base, "/repos/{owner}/{repo}", config)?;
        push_segments(&mut url, tail)?;
        Ok(url)
    }

    async fn head_sha(&self, config: &Map<String, Value>, branch: &str) -> anyhow::Result<String> {
        let mut url = self.repo_url(config, &["git", "ref", "heads"])?;
        push_path(&mut url, branch)?;
        let head = self.send(self.request(Method::Get, &url), &url).await?;
        sha_at(&head, "/object/sha").with_context(|| format!("ref heads/{branch} carried no object sha"))
    }

    async fn post(&self, url: Url, body: Value) -> anyhow::Result<Value> {
        let req = self.request(Method::Post, &url).json(&body);
        self.send(req, &url).await
    }

    /// Create `branchName` from the head of `base` (default `master`).
    async fn create_branch(&self, config: &Map<String, Value>) -> anyhow::Result<Value> {
        let branch = require(config, "branch_name")?;
        let base = scalar(config, "base").unwrap_or_else(|| DEFAULT_BRANCH.to_string());

        let sha = self.head_sha(config, &base).await?;
        let url = self.repo_url(config, &["git", "refs"])?;
        self.post(url, json!({ "ref": format!("refs/heads/{branch}"), "sha": sha }))
            .await
    }

    /// Commit `content` at `path` on top of `branch` (default `master`):
    /// blob, tree on the head tree, commit, then move the branch ref.
    async fn create_file(&self, config: &Map<String, Value>) -> anyhow::Result<Value> {
        let path = require(config, "path")?;
        let content = lookup(config, "content")
            .and_then(Value::as_str)
            .context("missing config field `content`")?;
        let branch = scalar(config, "branch").unwrap_or_else(|| DEFAULT_BRANCH.to_string());
        let message = scalar(config, "message").unwrap_or_else(|| format!("Create {path}"));

        let parent = self.head_sha(config, &branch).await?;
        let commit_url = self.repo_url(config, &["git", "commits", &parent])?;
        let parent_commit = self
            .send(self.request(Method::Get, &commit_url), &commit_url)
            .await?;
        let base_tree = sha_at(&parent_commit, "/tree/sha").context("head commit carried no tree")?;

        let blob = self
            .post(
                self.repo_url(config, &["git", "blobs"])?,
                json!({ "content": content, "encoding": "utf-8" }),
            )
            .await?;
        let blob_sha = sha_at(&blob, "/sha").context("blob response carried no sha")?;

        let tree = self
            .post(
                self.repo_url(config, &["git", "trees"])?,
                json!({
                    "base_tree": base_tree,
                    "tree": [{ "path": path, "mode": "100644", "type": "blob", "sha": blob_sha }],
                }),
            )
            .await?;
        let tree_sha = sha_at(&tree, "/sha").context("tree response carried no sha")?;

        let commit = self
            .post(
                self.repo_url(config, &["git", "commits"])?,
                json!({ "message": message, "tree": tree_sha, "parents": [parent] }),
            )
            .await?;
        let commit_sha = sha_at(&commit, "/sha").context("commit response carried no sha")?;

        let mut ref_url = self.repo_url(config, &["git", "refs", "heads"])?;
        push_path(&mut ref_url, &branch)?;
        let req = self
            .request(Method::Patch, &ref_url)
            .json(&json!({ "sha": commit_sha }));
        self.send(req, &ref_url).await?;

        tracing::info!(path = %path, branch = %branch, commit = %commit_sha, "file committed");
        Ok(commit)
    }
}

#[async_trait]
impl ExternalActions for GitHubActions {
    fn name(&self) -> &str {
        SERVICE
    }

    async fn invoke(
        &self,
        action: &str,
        config: &Map<String, Value>,
        cancel: &CancellationToken,
    ) -> anyhow::Result<String> {
        let action = action.trim();
        tracing::info!(action = %action, "github action");

        let call = async {
            match action {
                CREATE_BRANCH => return self.create_branch(config).await,
                CREATE_FILE => return self.create_file(config).await,
                _ => {}
            }
            match ACTIONS.iter().find(|spec| spec.name == action) {
                Some(spec) if spec.name == LIST_FILES => {
                    self.run_spec(spec, config).await.map(files_only)
                }
                Some(spec) => self.run_spec(spec, config).await,
                None if action.is_empty() => anyhow::bail!("github-tool task names no action"),
                None => anyhow::bail!("unknown github action: {action}"),
            }
        };

        let value = tokio::select! {
            biased;
            _ = cancel.cancelled() => anyhow::bail!("cancelled during github action {action}"),
            value = call => value?,
        };
        Ok(render(&value))
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => "ok".to_string(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}

fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for ch in key.chars() {
        if ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// Producers spell fields both `pull_number` and `pullNumber`.
fn lookup<'a>(config: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    config
        .get(key)
        .or_else(|| config.get(&camel_case(key)))
        .filter(|v| !v.is_null())
}

fn scalar(config: &Map<String, Value>, key: &str) -> Option<String> {
    match lookup(config, key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn require(config: &Map<String, Value>, key: &str) -> anyhow::Result<String> {
    scalar(config, key).ok_or_else(|| anyhow::anyhow!("missing config field `{key}`"))
}

fn sha_at(value: &Value, pointer: &str) -> Option<String> {
    value.pointer(pointer).and_then(Value::as_str).map(str::to_string)
}

/// Keep only file entries of a recursive git tree listing.
fn files_only(value: Value) -> Value {
    match value.get("tree").and_then(Value::as_array) {
        Some(entries) => Value::Array(
            entries
                .iter()
                .filter(|entry| entry.get("type").and_then(Value::as_str) == Some("blob"))
                .cloned()
                .collect(),
        ),
        None => value,
    }
}

fn push_segments(url: &mut Url, segments: &[&str]) -> anyhow::Result<()> {
    let mut path = url
        .path_segments_mut()
        .map_err(|_| anyhow::anyhow!("github api base cannot carry a path"))?;
    path.pop_if_empty().extend(segments);
    Ok(())
}

/// Append a `/`-separated value one encoded segment at a time.
fn push_path(url: &mut Url, value: &str) -> anyhow::Result<()> {
    let parts: Vec<&str> = value.split('/').filter(|part| !part.is_empty()).collect();
    if parts.is_empty() {
        anyhow::bail!("empty path value");
    }
    push_segments(url, &parts)
}

/// Fill `{field}` placeholders inside one path segment.
fn fill_segment(segment: &str, config: &Map<String, Value>) -> anyhow::Result<String> {
    let mut out = String::with_capacity(segment.len());
    let mut rest = segment;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after
            .find('}')
            .ok_or_else(|| anyhow::anyhow!("unterminated placeholder in {segment}"))?;
        out.push_str(&require(config, &after[..close])?);
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Resolve a path template (with an optional literal query) against `base`.
fn build_url(base: &str, template: &str, config: &Map<String, Value>) -> anyhow::Result<Url> {
    let (path, query) = match template.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (template, None),
    };
    let mut url = Url::parse(base).with_context(|| format!("invalid github api base {base}"))?;
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        if segment == "{path}" {
            push_path(&mut url, &require(config, "path")?)?;
        } else {
            push_segments(&mut url, &[&fill_segment(segment, config)?])?;
        }
    }
    url.set_query(query);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use pretty_assertions::assert_eq;

    fn cfg(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn actions(base: String) -> GitHubActions {
        GitHubActions::new(&GitHubConfig {
            token: Some("ghp_test".into()),
            api_base: base,
            user_agent: "taskmesh-test".into(),
        })
        .unwrap()
    }

    #[test]
    fn test_build_url_and_aliases() {
        let config = cfg(json!({"owner":"o","repo":"r","pullNumber":7}));
        let url = build_url(
            "https://api.github.com",
            "/repos/{owner}/{repo}/pulls/{pull_number}/merge",
            &config,
        )
        .unwrap();
        assert_eq!(url.as_str(), "https://api.github.com/repos/o/r/pulls/7/merge");
        let err = build_url("https://api.github.com", "/repos/{owner}/{missing}", &config).unwrap_err();
        assert!(err.to_string().contains("`missing`"));
    }

    #[test]
    fn test_build_url_encodes_values_as_single_segments() {
        let config = cfg(json!({
            "owner": "o",
            "repo": "r",
            "username": "octo/repos?x=1#frag",
            "path": "docs/guide/intro.md",
            "branch": "main",
        }));
        let base = "https://ghe.example.com/api/v3/";

        let url = build_url(base, "/users/{username}", &config).unwrap();
        assert_eq!(
            url.as_str(),
            "https://ghe.example.com/api/v3/users/octo%2Frepos%3Fx=1%23frag"
        );

        let url = build_url(base, "/repos/{owner}/{repo}/contents/{path}", &config).unwrap();
        assert_eq!(
            url.as_str(),
            "https://ghe.example.com/api/v3/repos/o/r/contents/docs/guide/intro.md"
        );

        let url = build_url(base, "/repos/{owner}/{repo}/git/trees/{branch}?recursive=1", &config)
            .unwrap();
        assert_eq!(url.query(), Some("recursive=1"));
        assert_eq!(url.path(), "/api/v3/repos/o/r/git/trees/main");
    }

    #[test]
    fn test_action_names_are_unique() {
        let names = action_names();
        let mut deduped = names.clone();
        deduped.dedup();
        assert_eq!(names, deduped);
        assert!(names.contains(&"createBranch"));
    }

    #[tokio::test]
    async fn test_create_issue_posts_body_with_headers() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/repos/octo/hello/issues")
            .match_header("authorization", "Bearer ghp_test")
            .match_header("user-agent", "taskmesh-test")
            .match_body(Matcher::Json(json!({"title":"Report","body":"done"})))
            .with_status(201)
            .with_body(r#"{"number":12}"#)
            .create_async()
            .await;

        let out = actions(server.url())
            .invoke(
                "createIssue",
                &cfg(json!({"owner":"octo","repo":"hello","title":"Report","body":"done","extra":1})),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(out.contains("\"number\": 12"));
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_search_uses_query_param() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/search/repositories")
            .match_query(Matcher::UrlEncoded("q".into(), "rust tokio".into()))
            .with_status(200)
            .with_body(r#"{"total_count":0,"items":[]}"#)
            .create_async()
            .await;

        actions(server.url())
            .invoke(
                "searchRepos",
                &cfg(json!({"query":"rust tokio"})),
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_branch_reads_base_then_creates_ref() {
        let mut server = Server::new_async().await;
        let head = server
            .mock("GET", "/repos/o/r/git/ref/heads/main")
            .with_status(200)
            .with_body(r#"{"object":{"sha":"abc123"}}"#)
            .create_async()
            .await;
        let create = server
            .mock("POST", "/repos/o/r/git/refs")
            .match_body(Matcher::Json(
                json!({"ref":"refs/heads/feature","sha":"abc123"}),
            ))
            .with_status(201)
            .with_body(r#"{"ref":"refs/heads/feature"}"#)
            .create_async()
            .await;

        actions(server.url())
            .invoke(
                "createBranch",
                &cfg(json!({"owner":"o","repo":"r","branchName":"feature","base":"main"})),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        head.assert_async().await;
        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_fields_and_unknown_actions_fail_before_network() {
        let github = actions("http://127.0.0.1:9".into());
        let cancel = CancellationToken::new();

        let err = github
            .invoke("createPullRequest", &cfg(json!({"owner":"o","repo":"r","title":"t"})), &cancel)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("`head`"));

        let err = github.invoke("dance", &Map::new(), &cancel).await.unwrap_err();
        assert_eq!(err.to_string(), "unknown github action: dance");
    }

    #[tokio::test]
    async fn test_status_error_is_classified() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/users/ghost")
            .with_status(404)
            .with_body(r#"{"message":"Not Found"}"#)
            .create_async()
            .await;

        let err = actions(server.url())
            .invoke("getUser", &cfg(json!({"username":"ghost"})), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.downcast_ref::<HttpError>().and_then(HttpError::status), Some(404));
    }

    #[tokio::test]
    async fn test_slash_in_value_stays_inside_one_segment() {
        let mut server = Server::new_async().await;
        let nested = server
            .mock("GET", "/users/octo/repos")
            .with_status(200)
            .with_body(r#"[{"name":"private-stuff"}]"#)
            .expect(0)
            .create_async()
            .await;
        let user = server
            .mock("GET", "/users/octo%2Frepos")
            .with_status(404)
            .with_body(r#"{"message":"Not Found"}"#)
            .create_async()
            .await;

        let err = actions(server.url())
            .invoke("getUser", &cfg(json!({"username":"octo/repos"})), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.downcast_ref::<HttpError>().and_then(HttpError::status), Some(404));
        user.assert_async().await;
        nested.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_files_keeps_only_blobs() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/repos/o/r/git/trees/main")
            .match_query(Matcher::UrlEncoded("recursive".into(), "1".into()))
            .with_status(200)
            .with_body(
                r#"{"sha":"t1","tree":[
                    {"path":"src","type":"tree","sha":"a"},
                    {"path":"src/lib.rs","type":"blob","sha":"b"},
                    {"path":"README.md","type":"blob","sha":"c"}
                ]}"#,
            )
            .create_async()
            .await;

        let out = actions(server.url())
            .invoke(
                "listFiles",
                &cfg(json!({"owner":"o","repo":"r","branch":"main"})),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        m.assert_async().await;
        let files: Vec<Value> = serde_json::from_str(&out).unwrap();
        let paths: Vec<&str> = files.iter().filter_map(|f| f["path"].as_str()).collect();
        assert_eq!(paths, vec!["src/lib.rs", "README.md"]);
    }

    #[tokio::test]
    async fn test_create_file_commits_on_branch_head() {
        let mut server = Server::new_async().await;
        let head = server
            .mock("GET", "/repos/o/r/git/ref/heads/release/1.0")
            .with_status(200)
            .with_body(r#"{"object":{"sha":"head1"}}"#)
            .create_async()
            .await;
        let parent = server
            .mock("GET", "/repos/o/r/git/commits/head1")
            .with_status(200)
            .with_body(r#"{"sha":"head1","tree":{"sha":"tree0"}}"#)
            .create_async()
            .await;
        let blob = server
            .mock("POST", "/repos/o/r/git/blobs")
            .match_body(Matcher::Json(json!({"content":"# Notes\n","encoding":"utf-8"})))
            .with_status(201)
            .with_body(r#"{"sha":"blob1"}"#)
            .create_async()
            .await;
        let tree = server
            .mock("POST", "/repos/o/r/git/trees")
            .match_body(Matcher::Json(json!({
                "base_tree": "tree0",
                "tree": [{"path":"docs/notes.md","mode":"100644","type":"blob","sha":"blob1"}]
            })))
            .with_status(201)
            .with_body(r#"{"sha":"tree1"}"#)
            .create_async()
            .await;
        let commit = server
            .mock("POST", "/repos/o/r/git/commits")
            .match_body(Matcher::Json(json!({
                "message": "Create docs/notes.md",
                "tree": "tree1",
                "parents": ["head1"]
            })))
            .with_status(201)
            .with_body(r#"{"sha":"commit1","message":"Create docs/notes.md"}"#)
            .create_async()
            .await;
        let update = server
            .mock("PATCH", "/repos/o/r/git/refs/heads/release/1.0")
            .match_body(Matcher::Json(json!({"sha":"commit1"})))
            .with_status(200)
            .with_body(r#"{"ref":"refs/heads/release/1.0"}"#)
            .create_async()
            .await;

        let out = actions(server.url())
            .invoke(
                "createFile",
                &cfg(json!({
                    "owner": "o",
                    "repo": "r",
                    "path": "docs/notes.md",
                    "content": "# Notes\n",
                    "branch": "release/1.0",
                })),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(out.contains("\"sha\": \"commit1\""));
        for mock in [head, parent, blob, tree, commit, update] {
            mock.assert_async().await;
        }
    }

    #[tokio::test]
    async fn test_create_file_requires_content() {
        let err = actions("http://127.0.0.1:9".into())
            .invoke(
                "createFile",
                &cfg(json!({"owner":"o","repo":"r","path":"a.txt"})),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("`content`"));
    }
}

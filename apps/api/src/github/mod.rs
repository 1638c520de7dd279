//! GitHub access: repository listing, file contents and the profile README URL.
//!
//! All calls carry the bearer token and go through the shared `RetryPolicy`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::GithubSettings;
use crate::fetch::FetchError;
use crate::retry::RetryPolicy;

pub mod pager;

use pager::RepoPager;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// One entry of `GET /users/{user}/repos`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub html_url: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub fork: bool,
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    download_url: Option<String>,
}

/// The source-control host as the pipeline sees it.
#[async_trait]
pub trait SourceHost: Send + Sync {
    /// Every repository owned by `username`, across all pages.
    async fn list_repositories(&self, username: &str) -> Result<Vec<Repository>, FetchError>;

    /// Raw text of `path` in `owner/repo`, or `None` when the file does not exist.
    async fn file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Option<String>, FetchError>;

    /// Where the profile README lives for `username`.
    fn profile_readme_url(&self, username: &str) -> String;
}

/// Raw URL of a user's profile README. Assumes the profile repository is named
/// after the user and its default branch is `main`.
pub fn readme_raw_url(raw_base: &str, username: &str) -> String {
    format!(
        "{}/{username}/{username}/main/README.md",
        raw_base.trim_end_matches('/')
    )
}

#[derive(Clone)]
pub struct GithubClient {
    client: Client,
    settings: GithubSettings,
    retry: RetryPolicy,
}

impl GithubClient {
    pub fn new(settings: GithubSettings, retry: RetryPolicy) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            settings,
            retry,
        })
    }

    fn api(&self, path: &str) -> String {
        format!("{}{path}", self.settings.api_url.trim_end_matches('/'))
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .bearer_auth(&self.settings.token)
            .header(header::ACCEPT, "application/vnd.github+json")
    }

    async fn get_once(&self, url: &str, authed: bool) -> Result<reqwest::Response, FetchError> {
        let builder = self.client.get(url);
        let builder = if authed { self.authed(builder) } else { builder };
        let response = builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn repo_page(&self, username: &str, page: u32) -> Result<Vec<Repository>, FetchError> {
        let url = self.api(&format!(
            "/users/{username}/repos?per_page={}&page={page}",
            pager::PER_PAGE
        ));
        let response = self.get_once(&url, true).await?;
        Ok(response.json().await?)
    }

    async fn content_once(&self, url: &str) -> Result<Option<String>, FetchError> {
        let entry: ContentEntry = match self.get_once(url, true).await {
            Ok(response) => response.json().await?,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        let Some(download_url) = entry.download_url else {
            return Ok(None);
        };
        let body = self.get_once(&download_url, false).await?.text().await?;
        Ok(Some(body))
    }
}

#[async_trait]
impl SourceHost for GithubClient {
    async fn list_repositories(&self, username: &str) -> Result<Vec<Repository>, FetchError> {
        let mut pager = RepoPager::new(self.settings.max_repo_pages);
        let mut repos = Vec::new();

        while let Some(page) = pager.next_page() {
            let batch = self
                .retry
                .run("repository listing", || self.repo_page(username, page))
                .await?;
            debug!("Repository page {} returned {} entries", page, batch.len());
            pager.record(batch.len());
            repos.extend(batch);
        }

        if pager.truncated() {
            warn!(
                "Repository listing for {} stopped at {} pages; later repositories were skipped",
                username,
                pager.pages_fetched()
            );
        }
        info!("Listed {} repositories for {}", repos.len(), username);
        Ok(repos)
    }

    async fn file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Option<String>, FetchError> {
        let url = self.api(&format!("/repos/{owner}/{repo}/contents/{path}"));
        self.retry
            .run("file content", || self.content_once(&url))
            .await
    }

    fn profile_readme_url(&self, username: &str) -> String {
        readme_raw_url(&self.settings.raw_url, username)
    }
}


#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use axum::{
        extract::Query,
        http::{HeaderMap, StatusCode},
        response::{IntoResponse, Response},
        routing::get,
        Json, Router,
    };
    use serde_json::json;

    use super::*;
    use crate::fetch::testing::{quick_retry, serve_local};

    const TOKEN: &str = "gh-test-token";

    fn client(base: &str) -> GithubClient {
        let settings = GithubSettings {
            api_url: base.to_string(),
            raw_url: base.to_string(),
            token: TOKEN.to_string(),
            max_repo_pages: 10,
        };
        GithubClient::new(settings, quick_retry()).unwrap()
    }

    fn authorized(headers: &HeaderMap) -> bool {
        let bearer = format!("Bearer {TOKEN}");
        headers.get("authorization").and_then(|v| v.to_str().ok()) == Some(bearer.as_str())
            && headers.get("accept").and_then(|v| v.to_str().ok())
                == Some("application/vnd.github+json")
    }

    fn repo_json(name: String) -> serde_json::Value {
        json!({
            "name": name,
            "html_url": format!("https://github.com/alice/{name}"),
            "language": "Rust",
            "fork": false
        })
    }

    #[tokio::test]
    async fn test_listing_walks_pages_until_short_page() {
        let pages_served = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&pages_served);
        let app = Router::new().route(
            "/users/alice/repos",
            get(
                move |headers: HeaderMap, Query(params): Query<HashMap<String, String>>| {
                    let counter = Arc::clone(&counter);
                    async move {
                        if !authorized(&headers) {
                            return StatusCode::UNAUTHORIZED.into_response();
                        }
                        counter.fetch_add(1, Ordering::SeqCst);
                        let count = match params.get("page").map(String::as_str) {
                            Some("1") => pager::PER_PAGE,
                            Some("2") => 3,
                            _ => 0,
                        };
                        let page = params.get("page").cloned().unwrap_or_default();
                        let repos: Vec<_> = (0..count)
                            .map(|i| repo_json(format!("repo-{page}-{i}")))
                            .collect();
                        Json(repos).into_response()
                    }
                },
            ),
        );
        let base = serve_local(app).await;

        let repos = client(&base).list_repositories("alice").await.unwrap();
        assert_eq!(repos.len(), pager::PER_PAGE + 3);
        assert_eq!(repos[0].name, "repo-1-0");
        assert_eq!(repos.last().unwrap().name, "repo-2-2");
        assert_eq!(pages_served.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unavailable_listing_is_retried() {
        let hits = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&hits);
        let app = Router::new().route(
            "/users/alice/repos",
            get(move || {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        StatusCode::SERVICE_UNAVAILABLE.into_response()
                    } else {
                        Json(vec![repo_json("solo".to_string())]).into_response()
                    }
                }
            }),
        );
        let base = serve_local(app).await;

        let repos = client(&base).list_repositories("alice").await.unwrap();
        assert_eq!(repos.len(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_file_content_follows_download_url() {
        async fn readme_entry(headers: HeaderMap) -> Response {
            if !authorized(&headers) {
                return StatusCode::UNAUTHORIZED.into_response();
            }
            let host = headers
                .get("host")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            Json(json!({ "download_url": format!("http://{host}/raw/tool/README.md") }))
                .into_response()
        }

        let app = Router::new()
            .route("/repos/alice/tool/contents/README.md", get(readme_entry))
            .route("/raw/tool/README.md", get(|| async { "# tool\nFast CLI." }))
            .route(
                "/repos/alice/tool/contents/docs",
                get(|| async { Json(json!({ "type": "dir" })) }),
            );
        let base = serve_local(app).await;
        let github = client(&base);

        let readme = github.file_content("alice", "tool", "README.md").await.unwrap();
        assert_eq!(readme.as_deref(), Some("# tool\nFast CLI."));

        let missing = github
            .file_content("alice", "tool", "requirements.txt")
            .await
            .unwrap();
        assert!(missing.is_none());

        let no_download = github.file_content("alice", "tool", "docs").await.unwrap();
        assert!(no_download.is_none());
    }

    #[test]
    fn test_readme_raw_url_convention() {
        assert_eq!(
            readme_raw_url("https://raw.githubusercontent.com/", "alice"),
            "https://raw.githubusercontent.com/alice/alice/main/README.md"
        );
    }

    #[test]
    fn test_repository_null_language_deserializes() {
        let json = r#"[{
            "name": "cool-ml-tool",
            "html_url": "https://github.com/alice/cool-ml-tool",
            "language": null,
            "fork": true,
            "stargazers_count": 4
        }]"#;
        let repos: Vec<Repository> = serde_json::from_str(json).unwrap();
        assert_eq!(repos[0].name, "cool-ml-tool");
        assert!(repos[0].language.is_none());
        assert!(repos[0].fork);
    }

    #[test]
    fn test_content_entry_without_download_url() {
        let entry: ContentEntry = serde_json::from_str(r#"{"type": "dir"}"#).unwrap();
        assert!(entry.download_url.is_none());
    }
}

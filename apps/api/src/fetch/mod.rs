//! Page fetching: downloads a URL and reduces HTML to readable text.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::info;

use crate::retry::{RetryPolicy, Retryable};

pub mod html;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::Status { status: 404, .. })
    }
}

impl Retryable for FetchError {
    fn is_transient(&self) -> bool {
        match self {
            FetchError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Timeout(_) => true,
        }
    }

    fn timed_out(after: Duration) -> Self {
        FetchError::Timeout(after)
    }
}

/// Fetches a page and returns its readable text.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// reqwest-backed fetcher. HTML responses are reduced to text; anything else
/// (raw markdown, plain text) is returned as-is.
#[derive(Clone)]
pub struct HttpPageFetcher {
    client: Client,
    retry: RetryPolicy,
}

impl HttpPageFetcher {
    pub fn new(retry: RetryPolicy) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, retry })
    }

    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("html"))
            .unwrap_or(false);

        let body = response.text().await?;
        Ok(if is_html {
            html::html_to_text(&body)
        } else {
            body
        })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        info!("Fetching page: {}", url);
        self.retry
            .run("page fetch", || self.fetch_once(url))
            .await
    }
}

#[cfg(test)]
pub mod testing {
    use std::collections::HashMap;

    use super::*;

    /// Serves fixed bodies by URL; unknown URLs answer 404.
    #[derive(Default)]
    pub struct StaticPages {
        pages: HashMap<String, String>,
    }

    impl StaticPages {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), body.to_string());
            self
        }
    }

    /// Serves `app` on an ephemeral localhost port and returns its base URL.
    pub async fn serve_local(app: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    /// Short backoff so retry tests against a live server stay fast.
    pub fn quick_retry() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(5), Duration::from_secs(5))
    }

    #[async_trait]
    impl PageFetcher for StaticPages {
        async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
            self.pages.get(url).cloned().ok_or(FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }
}

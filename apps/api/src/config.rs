use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::retry::RetryPolicy;

const DEFAULT_LLM_API_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_LLM_MODEL: &str = "llama-3.1-70b-versatile";
const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
const DEFAULT_GITHUB_RAW_URL: &str = "https://raw.githubusercontent.com";

/// Application configuration loaded from environment variables.
/// Fails at startup if either credential is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm: LlmSettings,
    pub github: GithubSettings,
    /// Where the sentence-embedding model is cached; fastembed's default when unset.
    pub embedding_cache_dir: Option<PathBuf>,
    pub http_timeout: Duration,
    pub llm_timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub port: u16,
    pub rust_log: String,
}

/// Everything the LLM client needs. Built once and injected; components never
/// construct their own client.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
}

#[derive(Debug, Clone)]
pub struct GithubSettings {
    pub api_url: String,
    pub raw_url: String,
    pub token: String,
    pub max_repo_pages: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            llm: LlmSettings {
                api_url: env_or("LLM_API_URL", DEFAULT_LLM_API_URL),
                api_key: require_env("GROQ_API_KEY")?,
                model: env_or("LLM_MODEL", DEFAULT_LLM_MODEL),
                temperature: parse_env("LLM_TEMPERATURE", 0.0)?,
            },
            github: GithubSettings {
                api_url: env_or("GITHUB_API_URL", DEFAULT_GITHUB_API_URL),
                raw_url: env_or("GITHUB_RAW_URL", DEFAULT_GITHUB_RAW_URL),
                token: require_env("GITHUB_TOKEN")?,
                max_repo_pages: parse_env("MAX_REPO_PAGES", 10)?,
            },
            embedding_cache_dir: optional_env("EMBEDDING_CACHE_DIR").map(PathBuf::from),
            http_timeout: Duration::from_secs(parse_env("HTTP_TIMEOUT_SECS", 30)?),
            llm_timeout: Duration::from_secs(parse_env("LLM_TIMEOUT_SECS", 120)?),
            max_retries: parse_env("MAX_RETRIES", 3)?,
            retry_base_delay: Duration::from_millis(parse_env("RETRY_BASE_DELAY_MS", 1000)?),
            port: parse_env("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    /// Retry policy for page and GitHub fetches.
    pub fn fetch_retry(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_base_delay, self.http_timeout)
    }

    /// Retry policy for LLM completions, which get a longer per-attempt timeout.
    pub fn llm_retry(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.retry_base_delay, self.llm_timeout)
    }
}

#[cfg(test)]
impl Config {
    /// Defaults with placeholder credentials, for handler tests.
    pub fn for_tests() -> Self {
        Config {
            llm: LlmSettings {
                api_url: DEFAULT_LLM_API_URL.to_string(),
                api_key: "test-key".to_string(),
                model: DEFAULT_LLM_MODEL.to_string(),
                temperature: 0.0,
            },
            github: GithubSettings {
                api_url: DEFAULT_GITHUB_API_URL.to_string(),
                raw_url: DEFAULT_GITHUB_RAW_URL.to_string(),
                token: "test-token".to_string(),
                max_repo_pages: 10,
            },
            embedding_cache_dir: None,
            http_timeout: Duration::from_secs(30),
            llm_timeout: Duration::from_secs(120),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(1000),
            port: 8080,
            rust_log: "info".to_string(),
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}

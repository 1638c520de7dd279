/// LLM Client: the single point of entry for all completion calls.
///
/// ARCHITECTURAL RULE: No other module may call the completion API directly.
/// Components receive a `&dyn Completion` and never build their own client.
///
/// Speaks the OpenAI-compatible `/chat/completions` protocol (Groq by default).
/// Model, temperature and endpoint come from `LlmSettings`.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::LlmSettings;
use crate::retry::{RetryPolicy, Retryable};

pub mod prompts;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM call timed out after {0:?}")]
    Timeout(Duration),

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl Retryable for LlmError {
    fn is_transient(&self) -> bool {
        match self {
            LlmError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            LlmError::Timeout(_) => true,
            LlmError::Parse(_) | LlmError::EmptyContent => false,
        }
    }

    fn timed_out(after: Duration) -> Self {
        LlmError::Timeout(after)
    }
}

/// Anything that turns a prompt into text. The pipeline only depends on this.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text of the first choice.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Chat-completions client with timeout and retry on 429 / 5xx / transport errors.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    settings: LlmSettings,
    retry: RetryPolicy,
}

impl LlmClient {
    pub fn new(settings: LlmSettings, retry: RetryPolicy) -> Result<Self, LlmError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            settings,
            retry,
        })
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.api_url.trim_end_matches('/')
        )
    }

    /// Makes a raw call, returning the full response object.
    pub async fn call(&self, prompt: &str) -> Result<LlmResponse, LlmError> {
        let request_body = ChatRequest {
            model: &self.settings.model,
            temperature: self.settings.temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };
        let endpoint = self.endpoint();

        let llm_response = self
            .retry
            .run("LLM call", || self.send_once(&endpoint, &request_body))
            .await?;

        if let Some(usage) = &llm_response.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        Ok(llm_response)
    }

    async fn send_once(
        &self,
        endpoint: &str,
        request_body: &ChatRequest<'_>,
    ) -> Result<LlmResponse, LlmError> {
        let response = self
            .client
            .post(endpoint)
            .bearer_auth(&self.settings.api_key)
            .json(request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl Completion for LlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let response = self.call(prompt).await?;
        response
            .text()
            .map(|t| t.trim().to_string())
            .ok_or(LlmError::EmptyContent)
    }
}

/// Calls the LLM and deserializes the text response as JSON.
/// The prompt must instruct the model to return valid JSON.
pub async fn call_json<T: DeserializeOwned>(
    llm: &dyn Completion,
    prompt: &str,
) -> Result<T, LlmError> {
    let text = llm.complete(prompt).await?;

    // Strip markdown code fences if the model wraps JSON in them
    let text = strip_json_fences(&text);

    serde_json::from_str(text).map_err(LlmError::Parse)
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}


#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use axum::{
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::post,
        Json, Router,
    };
    use serde_json::{json, Value};

    use super::testing::ScriptedLlm;
    use super::*;
    use crate::fetch::testing::{quick_retry, serve_local};

    fn client(base: &str) -> LlmClient {
        let settings = LlmSettings {
            api_url: base.to_string(),
            api_key: "llm-test-key".to_string(),
            model: "test-model".to_string(),
            temperature: 0.0,
        };
        LlmClient::new(settings, quick_retry()).unwrap()
    }

    #[tokio::test]
    async fn test_overloaded_endpoint_is_retried() {
        let hits = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&hits);
        let app = Router::new().route(
            "/chat/completions",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let counter = Arc::clone(&counter);
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        return StatusCode::SERVICE_UNAVAILABLE.into_response();
                    }
                    let authorized = headers.get("authorization").and_then(|v| v.to_str().ok())
                        == Some("Bearer llm-test-key");
                    if !authorized || body["model"] != "test-model" {
                        return StatusCode::UNAUTHORIZED.into_response();
                    }
                    let prompt = body["messages"][0]["content"].as_str().unwrap_or_default();
                    Json(json!({
                        "choices": [{ "message": { "content": format!("  echo: {prompt}\n") } }],
                        "usage": { "prompt_tokens": 3, "completion_tokens": 2 }
                    }))
                    .into_response()
                }
            }),
        );
        let base = serve_local(app).await;

        let text = client(&base).complete("hello").await.unwrap();
        assert_eq!(text, "echo: hello");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_rejected_request_reports_api_message() {
        let hits = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&hits);
        let app = Router::new().route(
            "/chat/completions",
            post(move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    (
                        StatusCode::BAD_REQUEST,
                        Json(json!({ "error": { "message": "bad model" } })),
                    )
                }
            }),
        );
        let base = serve_local(app).await;

        let err = client(&base).complete("hello").await.unwrap_err();
        assert!(
            matches!(err, LlmError::Api { status: 400, ref message } if message == "bad model"),
            "unexpected error: {err}"
        );
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_response_text_reads_first_choice() {
        let json = r#"{
            "choices": [{"message": {"role": "assistant", "content": "Dear hiring team"}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
        }"#;
        let response: LlmResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text(), Some("Dear hiring team"));
        assert_eq!(response.usage.unwrap().completion_tokens, 3);
    }

    #[test]
    fn test_response_text_none_when_blank() {
        let json = r#"{"choices": [{"message": {"content": "   "}}]}"#;
        let response: LlmResponse = serde_json::from_str(json).unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn test_rate_limit_and_server_errors_are_transient() {
        let limited = LlmError::Api {
            status: 429,
            message: "slow down".into(),
        };
        let unavailable = LlmError::Api {
            status: 503,
            message: "down".into(),
        };
        let unauthorized = LlmError::Api {
            status: 401,
            message: "bad key".into(),
        };
        assert!(limited.is_transient());
        assert!(unavailable.is_transient());
        assert!(!unauthorized.is_transient());
        assert!(!LlmError::EmptyContent.is_transient());
    }

    #[tokio::test]
    async fn test_call_json_parses_fenced_output() {
        let llm = ScriptedLlm::new().then("```json\n{\"title\": \"Engineer\"}\n```");
        let value: serde_json::Value = call_json(&llm, "extract").await.unwrap();
        assert_eq!(value["title"], "Engineer");
    }

    #[tokio::test]
    async fn test_call_json_reports_parse_error() {
        let llm = ScriptedLlm::new().then("Sure! Here is the JSON you asked for.");
        let result: Result<serde_json::Value, _> = call_json(&llm, "extract").await;
        assert!(matches!(result, Err(LlmError::Parse(_))));
    }
}

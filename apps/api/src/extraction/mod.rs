// Extraction stages: job posting, candidate profile and per-repository summaries.
// All LLM calls go through llm_client; stages only see `&dyn Completion`.

pub mod experience;
pub mod job;
pub mod lenient;
pub mod profile;
pub mod projects;
pub mod prompts;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::AppError;
use crate::llm_client::{call_json, Completion};

/// Upper bound on scraped text placed into a single prompt.
pub const MAX_PROMPT_CHARS: usize = 24_000;

/// Runs an extraction prompt and decodes the reply into `T`.
///
/// A top-level JSON array is accepted and its first element used. Anything that
/// is not JSON, or does not fit `T`, becomes `AppError::UnparsableExtraction`.
pub async fn extract_json<T: DeserializeOwned>(
    llm: &dyn Completion,
    prompt: &str,
    what: &'static str,
) -> Result<T, AppError> {
    let value: Value = call_json(llm, prompt)
        .await
        .map_err(|e| AppError::from_extraction(what, e))?;

    let value = match value {
        Value::Array(items) => items.into_iter().next().unwrap_or(Value::Null),
        other => other,
    };

    serde_json::from_value(value)
        .map_err(|source| AppError::UnparsableExtraction { what, source })
}

/// Cuts `text` to at most `max` characters on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

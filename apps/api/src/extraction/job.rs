//! Job Posting Extractor: turns a careers page into a structured `JobPosting`.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::extraction::experience::{self, ExperienceRequirement};
use crate::extraction::prompts::JOB_EXTRACT_PROMPT;
use crate::extraction::{extract_json, lenient, truncate_chars, MAX_PROMPT_CHARS};
use crate::fetch::PageFetcher;
use crate::llm_client::prompts::{fill, JSON_ONLY_TRAILER};
use crate::llm_client::Completion;

/// Facts pulled out of a single job posting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub requirements: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub responsibilities: String,
    #[serde(default, deserialize_with = "experience::from_llm")]
    pub experience_years: ExperienceRequirement,
}

/// Fetches `url` and extracts the posting it describes.
pub async fn extract_job_posting(
    url: &str,
    fetcher: &dyn PageFetcher,
    llm: &dyn Completion,
) -> Result<JobPosting, AppError> {
    let page = fetcher
        .fetch_text(url)
        .await
        .map_err(|e| AppError::Upstream(format!("Failed to load job posting {url}: {e}")))?;

    if page.trim().is_empty() {
        return Err(AppError::Upstream(format!(
            "Job posting {url} has no readable text"
        )));
    }

    let job = parse_job_posting(&page, llm).await?;
    info!(
        "Job posting parsed: title={:?}, requirements={}, experience={}",
        job.title,
        job.requirements.len(),
        job.experience_years
    );
    Ok(job)
}

/// Runs the extraction prompt over already-fetched page text.
pub async fn parse_job_posting(
    page_text: &str,
    llm: &dyn Completion,
) -> Result<JobPosting, AppError> {
    let prompt = fill(
        JOB_EXTRACT_PROMPT,
        &[
            ("page_data", truncate_chars(page_text, MAX_PROMPT_CHARS)),
            ("json_only", JSON_ONLY_TRAILER),
        ],
    );
    extract_json(llm, &prompt, "job posting").await
}

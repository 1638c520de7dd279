//! Profile Extractor: reads the candidate's GitHub profile README.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::extraction::prompts::PROFILE_EXTRACT_PROMPT;
use crate::extraction::{extract_json, lenient, truncate_chars, MAX_PROMPT_CHARS};
use crate::fetch::PageFetcher;
use crate::github::SourceHost;
use crate::llm_client::prompts::{fill, JSON_ONLY_TRAILER};
use crate::llm_client::Completion;

/// What the README says about the candidate. All five keys are always present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    /// Primary role first.
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub role: Vec<String>,
    /// Years; 0 for students.
    #[serde(default, deserialize_with = "lenient::count")]
    pub experience_duration: u32,
    #[serde(default, deserialize_with = "lenient::string")]
    pub experience: String,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub description: String,
}

impl CandidateProfile {
    pub fn primary_role(&self) -> Option<&str> {
        self.role.first().map(String::as_str)
    }
}

/// Fetches `username`'s profile README and extracts the candidate profile.
pub async fn extract_profile(
    username: &str,
    host: &dyn SourceHost,
    fetcher: &dyn PageFetcher,
    llm: &dyn Completion,
) -> Result<CandidateProfile, AppError> {
    let readme_url = host.profile_readme_url(username);
    let readme = fetcher.fetch_text(&readme_url).await.map_err(|e| {
        AppError::Upstream(format!("Failed to load profile README for {username}: {e}"))
    })?;

    let profile = parse_profile(&readme, llm).await?;
    info!(
        "Profile parsed for {}: primary_role={:?}, skills={}",
        username,
        profile.primary_role(),
        profile.skills.len()
    );
    Ok(profile)
}

/// Runs the extraction prompt over README text.
pub async fn parse_profile(
    readme_text: &str,
    llm: &dyn Completion,
) -> Result<CandidateProfile, AppError> {
    let prompt = fill(
        PROFILE_EXTRACT_PROMPT,
        &[
            ("page_data", truncate_chars(readme_text, MAX_PROMPT_CHARS)),
            ("json_only", JSON_ONLY_TRAILER),
        ],
    );
    extract_json(llm, &prompt, "profile README").await
}

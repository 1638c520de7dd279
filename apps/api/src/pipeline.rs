//! End-to-end letter generation: job posting → profile → projects → knowledge
//! store → letter.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, Instrument};
use url::Url;
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::job::{extract_job_posting, JobPosting};
use crate::extraction::profile::{extract_profile, CandidateProfile};
use crate::extraction::projects::{summarize_projects, ProjectSummary};
use crate::fetch::PageFetcher;
use crate::github::SourceHost;
use crate::knowledge::embedder::Embedder;
use crate::knowledge::{register_candidate, KnowledgeStore};
use crate::letter::{compose_letter, matched_project_names};
use crate::llm_client::Completion;

const MAX_USERNAME_LEN: usize = 39;

const MISSING_INPUT: &str = "Please provide both GitHub username and job posting URL.";

/// A finished letter and everything it was built from.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedLetter {
    pub letter: String,
    pub job: JobPosting,
    pub profile: CandidateProfile,
    pub projects: Vec<ProjectSummary>,
    /// Projects the knowledge store surfaced for this job, best match first.
    pub matched_projects: Vec<String>,
}

/// Collaborators for one generation run. Cheap to clone; built once at startup.
#[derive(Clone)]
pub struct LetterPipeline {
    pub llm: Arc<dyn Completion>,
    pub fetcher: Arc<dyn PageFetcher>,
    pub host: Arc<dyn SourceHost>,
    pub embedder: Arc<dyn Embedder>,
}

impl LetterPipeline {
    pub fn new(
        llm: Arc<dyn Completion>,
        fetcher: Arc<dyn PageFetcher>,
        host: Arc<dyn SourceHost>,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            llm,
            fetcher,
            host,
            embedder,
        }
    }

    pub async fn generate(
        &self,
        username: &str,
        job_url: &str,
    ) -> Result<GeneratedLetter, AppError> {
        let (username, job_url) = validate_inputs(username, job_url)?;
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("letter_run", %run_id, username = %username);

        self.run(username, job_url.as_str()).instrument(span).await
    }

    async fn run(&self, username: &str, job_url: &str) -> Result<GeneratedLetter, AppError> {
        let llm = self.llm.as_ref();

        info!("Extracting job posting from {job_url}");
        let job = extract_job_posting(job_url, self.fetcher.as_ref(), llm).await?;

        info!("Extracting profile for {username}");
        let profile = extract_profile(username, self.host.as_ref(), self.fetcher.as_ref(), llm).await?;

        let projects = summarize_projects(username, self.host.as_ref(), llm).await?;

        let mut store = KnowledgeStore::new(Arc::clone(&self.embedder));
        register_candidate(&mut store, &profile, &projects).await?;
        info!("Knowledge store holds {} documents", store.len());

        let composed = compose_letter(&job, &store, llm).await?;
        let matched_projects = matched_project_names(&composed.matches);
        info!(
            "Letter generated ({} chars, {} matched projects)",
            composed.text.len(),
            matched_projects.len()
        );

        Ok(GeneratedLetter {
            letter: composed.text,
            job,
            profile,
            projects,
            matched_projects,
        })
    }
}

/// Trims both inputs and checks that the job URL is an absolute http(s) URL.
pub fn validate_inputs<'a>(username: &'a str, job_url: &str) -> Result<(&'a str, Url), AppError> {
    let username = username.trim();
    let job_url = job_url.trim();
    if username.is_empty() || job_url.is_empty() {
        return Err(AppError::Validation(MISSING_INPUT.to_string()));
    }

    if !is_github_username(username) {
        return Err(AppError::Validation(format!(
            "'{username}' is not a valid GitHub username"
        )));
    }

    let parsed = Url::parse(job_url)
        .map_err(|e| AppError::Validation(format!("Invalid job posting URL '{job_url}': {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok((username, parsed)),
        other => Err(AppError::Validation(format!(
            "Job posting URL must use http or https, got '{other}'"
        ))),
    }
}

/// GitHub login rules: 1 to 39 ASCII alphanumerics or single hyphens, not
/// starting or ending with a hyphen.
fn is_github_username(name: &str) -> bool {
    name.len() <= MAX_USERNAME_LEN
        && !name.starts_with('-')
        && !name.ends_with('-')
        && !name.contains("--")
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

//! Project Summarizer: one `ProjectSummary` per candidate repository.
//!
//! Flow per repository: fetch requirements.txt + README.md (either may be absent) →
//! summarize each present file → classify into type / technologies / goal.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::extraction::lenient::split_list;
use crate::extraction::prompts::{CLASSIFY_PROMPT, SUMMARIZE_PROMPT};
use crate::extraction::{truncate_chars, MAX_PROMPT_CHARS};
use crate::github::{Repository, SourceHost};
use crate::llm_client::prompts::fill;
use crate::llm_client::Completion;

const REQUIREMENTS_FILE: &str = "requirements.txt";
const README_FILE: &str = "README.md";

/// Labels the model sometimes prefixes despite being told not to.
const CLASSIFICATION_LABELS: [&str; 7] = [
    "project type",
    "type",
    "main technologies",
    "technologies",
    "primary goal",
    "goal",
    "purpose",
];

/// LLM-derived classification of one repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub name: String,
    pub url: String,
    pub primary_language: String,
    pub project_type: String,
    pub technologies: Vec<String>,
    pub primary_goal: String,
}

/// Lists `username`'s repositories and summarizes every one except the
/// profile README repository.
pub async fn summarize_projects(
    username: &str,
    host: &dyn SourceHost,
    llm: &dyn Completion,
) -> Result<Vec<ProjectSummary>, AppError> {
    let repos = host.list_repositories(username).await.map_err(|e| {
        AppError::Upstream(format!("Failed to list repositories for {username}: {e}"))
    })?;

    let repos = select_project_repos(username, repos);
    let forks = repos.iter().filter(|r| r.fork).count();
    info!(
        "Summarizing {} repositories for {} ({} forks)",
        repos.len(),
        username,
        forks
    );

    let mut summaries = Vec::with_capacity(repos.len());
    for repo in &repos {
        summaries.push(summarize_repository(username, repo, host, llm).await?);
    }
    Ok(summaries)
}

/// Drops the profile repository, identified by name rather than list position.
pub fn select_project_repos(username: &str, repos: Vec<Repository>) -> Vec<Repository> {
    repos
        .into_iter()
        .filter(|r| !r.name.eq_ignore_ascii_case(username))
        .collect()
}

pub async fn summarize_repository(
    owner: &str,
    repo: &Repository,
    host: &dyn SourceHost,
    llm: &dyn Completion,
) -> Result<ProjectSummary, AppError> {
    let requirements = fetch_optional(host, owner, &repo.name, REQUIREMENTS_FILE).await;
    let readme = fetch_optional(host, owner, &repo.name, README_FILE).await;

    let requirements_summary = match requirements {
        Some(content) => summarize_content(&content, llm).await?,
        None => String::new(),
    };
    let readme_summary = match readme {
        Some(content) => summarize_content(&content, llm).await?,
        None => String::new(),
    };

    let language = repo.language.clone().unwrap_or_default();
    let project_info = format!(
        "Project Name: {}\nPrimary Language: {}\nRequirements Summary: {}\nREADME Summary:\n{}",
        repo.name, language, requirements_summary, readme_summary
    );

    let reply = llm
        .complete(&fill(CLASSIFY_PROMPT, &[("project_info", project_info.as_str())]))
        .await
        .map_err(|e| AppError::Llm(format!("Classifying {} failed: {e}", repo.name)))?;

    let (project_type, technologies, primary_goal) = parse_classification(&reply);
    if primary_goal.is_empty() {
        warn!(
            "Classification for {} returned fewer than three lines; keeping partial data",
            repo.name
        );
    }

    Ok(ProjectSummary {
        name: repo.name.clone(),
        url: repo.html_url.clone(),
        primary_language: language,
        project_type,
        technologies: split_list(&technologies),
        primary_goal,
    })
}

/// An optional file: missing, empty, or failing to load all count as absent.
async fn fetch_optional(
    host: &dyn SourceHost,
    owner: &str,
    repo: &str,
    path: &str,
) -> Option<String> {
    match host.file_content(owner, repo, path).await {
        Ok(Some(content)) if !content.trim().is_empty() => Some(content),
        Ok(_) => None,
        Err(e) => {
            warn!("Could not load {repo}/{path}, treating as absent: {e}");
            None
        }
    }
}

async fn summarize_content(content: &str, llm: &dyn Completion) -> Result<String, AppError> {
    let prompt = fill(
        SUMMARIZE_PROMPT,
        &[("content", truncate_chars(content, MAX_PROMPT_CHARS))],
    );
    llm.complete(&prompt)
        .await
        .map(|s| s.trim().to_string())
        .map_err(|e| AppError::Llm(format!("Summarizing content failed: {e}")))
}

/// Splits a classification reply into (project type, technologies, primary goal).
/// Missing lines come back as empty strings.
pub fn parse_classification(reply: &str) -> (String, String, String) {
    let mut lines = reply
        .lines()
        .map(clean_line)
        .filter(|line| !line.is_empty());

    let project_type = lines.next().unwrap_or_default();
    let technologies = lines.next().unwrap_or_default();
    let primary_goal = lines.next().unwrap_or_default();
    (project_type, technologies, primary_goal)
}

fn clean_line(line: &str) -> String {
    let mut line = line.trim();

    for bullet in ["- ", "* ", "• "] {
        if let Some(rest) = line.strip_prefix(bullet) {
            line = rest.trim_start();
        }
    }
    let numbered = line
        .char_indices()
        .take_while(|(_, c)| c.is_ascii_digit())
        .last()
        .map(|(i, _)| i + 1);
    if let Some(end) = numbered {
        let marker = line[end..]
            .strip_prefix(['.', ')'])
            .filter(|rest| rest.starts_with(char::is_whitespace));
        if let Some(rest) = marker {
            line = rest.trim_start();
        }
    }

    let line = line.trim_matches('*').trim();
    if let Some((label, rest)) = line.split_once(':') {
        let label = label.trim().trim_matches('*').to_lowercase();
        if CLASSIFICATION_LABELS.contains(&label.as_str()) {
            return rest.trim().trim_matches('*').trim().to_string();
        }
    }
    line.to_string()
}

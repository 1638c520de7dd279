//! Letter Composer: retrieves the candidate's best-matching documents for a job
//! and asks the LLM to write the application letter around them.

pub mod prompts;

use tracing::info;

use crate::errors::AppError;
use crate::extraction::job::JobPosting;
use crate::knowledge::{KnowledgeStore, ScoredDocument};
use crate::letter::prompts::{LETTER_PROMPT_TEMPLATE, RETRIEVAL_QUERY_TEMPLATE};
use crate::llm_client::prompts::fill;
use crate::llm_client::Completion;

/// Number of knowledge-store matches placed in the letter prompt.
pub const LETTER_TOP_K: usize = 5;

/// File name offered for the downloaded letter.
pub const LETTER_FILE_NAME: &str = "application_letter.txt";

const FALLBACK_TITLE: &str = "AI-related role";
const FALLBACK_TEXT: &str = "N/A";

/// The job facts as they appear in prompts, with fallbacks for blanks.
struct JobFacts {
    title: String,
    requirements: String,
    responsibilities: String,
}

impl JobFacts {
    fn from_job(job: &JobPosting) -> Self {
        Self {
            title: non_blank_or(&job.title, FALLBACK_TITLE),
            requirements: job.requirements.join("; "),
            responsibilities: non_blank_or(&job.responsibilities, FALLBACK_TEXT),
        }
    }
}

/// Natural-language query for the knowledge store built from the job facts.
pub fn build_retrieval_query(job: &JobPosting) -> String {
    let facts = JobFacts::from_job(job);
    fill(
        RETRIEVAL_QUERY_TEMPLATE,
        &[
            ("job_title", facts.title.as_str()),
            ("job_requirements", facts.requirements.as_str()),
            ("job_responsibilities", facts.responsibilities.as_str()),
        ],
    )
}

/// One `- <project_name>: <text>` line per match. Documents without a project
/// name (the README) are listed as `N/A`.
pub fn format_matches(matches: &[ScoredDocument]) -> String {
    matches
        .iter()
        .map(|m| {
            let name = m
                .document
                .metadata
                .get("project_name")
                .map(String::as_str)
                .unwrap_or(FALLBACK_TEXT);
            format!("- {name}: {}", m.document.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Names of the projects among `matches`, in rank order.
pub fn matched_project_names(matches: &[ScoredDocument]) -> Vec<String> {
    matches
        .iter()
        .filter_map(|m| m.document.metadata.get("project_name").cloned())
        .collect()
}

/// Output of the composer: the letter plus what it was grounded on.
#[derive(Debug, Clone)]
pub struct ComposedLetter {
    pub text: String,
    pub matches: Vec<ScoredDocument>,
}

pub async fn compose_letter(
    job: &JobPosting,
    store: &KnowledgeStore,
    llm: &dyn Completion,
) -> Result<ComposedLetter, AppError> {
    let query = build_retrieval_query(job);
    let matches = store.query(&query, LETTER_TOP_K).await?;
    info!(
        "Composing letter for {:?} with {} matched documents",
        job.title,
        matches.len()
    );

    let facts = JobFacts::from_job(job);
    let experience = job.experience_years.to_string();
    let relevant_projects = format_matches(&matches);
    let prompt = fill(
        LETTER_PROMPT_TEMPLATE,
        &[
            ("job_title", facts.title.as_str()),
            ("job_requirements", facts.requirements.as_str()),
            ("job_responsibilities", facts.responsibilities.as_str()),
            ("experience_years", experience.as_str()),
            ("relevant_projects", relevant_projects.as_str()),
        ],
    );

    let text = llm
        .complete(&prompt)
        .await
        .map_err(|e| AppError::Llm(format!("Letter generation failed: {e}")))?;
    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(AppError::Llm("Letter generation returned no text".to_string()));
    }

    Ok(ComposedLetter { text, matches })
}

fn non_blank_or(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::extraction::experience::ExperienceRequirement;
    use crate::knowledge::embedder::HashingEmbedder;
    use crate::knowledge::{Document, Metadata};
    use crate::llm_client::testing::ScriptedLlm;

    fn job() -> JobPosting {
        JobPosting {
            title: "ML Engineer".into(),
            requirements: vec!["3+ years Python".into(), "ML experience".into()],
            responsibilities: "Build and deploy ML models".into(),
            experience_years: ExperienceRequirement::AtLeast(3),
        }
    }

    fn scored(id: &str, text: &str, project: Option<&str>) -> ScoredDocument {
        let mut metadata = Metadata::new();
        if let Some(name) = project {
            metadata.insert("project_name".into(), name.into());
        }
        ScoredDocument {
            document: Document {
                id: id.into(),
                text: text.into(),
                metadata,
            },
            score: 0.5,
        }
    }

    #[test]
    fn test_retrieval_query_carries_job_facts() {
        let query = build_retrieval_query(&job());
        assert!(query.contains("'ML Engineer'"));
        assert!(query.contains("3+ years Python; ML experience"));
        assert!(query.contains("Build and deploy ML models"));
    }

    #[test]
    fn test_blank_job_uses_fallbacks() {
        let query = build_retrieval_query(&JobPosting::default());
        assert!(query.contains("'AI-related role'"));
        assert!(query.contains("responsibilities:\nN/A"));
    }

    #[test]
    fn test_format_matches_falls_back_to_na_for_readme() {
        let lines = format_matches(&[
            scored("cool-ml-tool", "Train ML models", Some("cool-ml-tool")),
            scored("readme", "Alice builds ML tools", None),
        ]);
        assert_eq!(
            lines,
            "- cool-ml-tool: Train ML models\n- N/A: Alice builds ML tools"
        );
    }

    #[test]
    fn test_matched_project_names_skips_readme() {
        let names = matched_project_names(&[
            scored("readme", "bio", None),
            scored("tool", "goal", Some("tool")),
        ]);
        assert_eq!(names, vec!["tool"]);
    }

    #[tokio::test]
    async fn test_compose_letter_uses_at_most_five_matches() {
        let mut store = KnowledgeStore::new(Arc::new(HashingEmbedder::default()));
        for i in 0..7 {
            let mut metadata = Metadata::new();
            metadata.insert("project_name".into(), format!("project-{i}"));
            store
                .register(format!("project-{i}"), format!("Python ML project {i}"), metadata)
                .await
                .unwrap();
        }
        let llm = ScriptedLlm::new().then("  Dear Hiring Manager,\nI built (project-0).  \n");

        let letter = compose_letter(&job(), &store, &llm).await.unwrap();
        assert_eq!(letter.matches.len(), LETTER_TOP_K);
        assert_eq!(letter.text, "Dear Hiring Manager,\nI built (project-0).");

        let prompt = &llm.prompts()[0];
        assert_eq!(prompt.matches("- project-").count(), LETTER_TOP_K);
        assert!(prompt.contains("Required Experience: at least 3 years"));
    }

    #[tokio::test]
    async fn test_blank_completion_is_error() {
        let store = KnowledgeStore::new(Arc::new(HashingEmbedder::default()));
        let llm = ScriptedLlm::new().then("   ");
        let err = compose_letter(&job(), &store, &llm).await.unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
    }
}

//! Knowledge Store: in-memory similarity index over the candidate's documents.
//!
//! One store per pipeline run: the README description plus one document per
//! project. Dropped with the run; nothing is persisted.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::extraction::profile::CandidateProfile;
use crate::extraction::projects::ProjectSummary;

pub mod embedder;

use embedder::{cosine_similarity, EmbedError, Embedder};

pub const README_DOCUMENT_ID: &str = "readme";

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("document id '{0}' is already registered")]
    DuplicateId(String),

    #[error(transparent)]
    Embedding(#[from] EmbedError),
}

pub type Metadata = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f32,
}

struct Entry {
    document: Document,
    vector: Vec<f32>,
}

pub struct KnowledgeStore {
    embedder: Arc<dyn Embedder>,
    entries: Vec<Entry>,
    ids: HashSet<String>,
}

impl KnowledgeStore {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            entries: Vec::new(),
            ids: HashSet::new(),
        }
    }

    /// Indexes `text` under `id`. Ids must be unique within the store.
    pub async fn register(
        &mut self,
        id: impl Into<String>,
        text: impl Into<String>,
        metadata: Metadata,
    ) -> Result<(), KnowledgeError> {
        let document = Document {
            id: id.into(),
            text: text.into(),
            metadata,
        };
        self.register_all(vec![document]).await
    }

    /// Indexes `documents` with a single embedding call. Nothing is stored if
    /// any id is already taken or repeated within the batch.
    pub async fn register_all(&mut self, documents: Vec<Document>) -> Result<(), KnowledgeError> {
        {
            let mut batch_ids = HashSet::new();
            for doc in &documents {
                if self.ids.contains(&doc.id) || !batch_ids.insert(doc.id.as_str()) {
                    return Err(KnowledgeError::DuplicateId(doc.id.clone()));
                }
            }
        }

        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let vectors = self.embedder.embed(&texts).await?;
        if vectors.len() != documents.len() {
            return Err(EmbedError::CountMismatch {
                expected: documents.len(),
                got: vectors.len(),
            }
            .into());
        }

        for (document, vector) in documents.into_iter().zip(vectors) {
            self.ids.insert(document.id.clone());
            self.entries.push(Entry { document, vector });
        }
        Ok(())
    }

    /// Up to `top_k` documents, most similar to `text` first. Equal scores keep
    /// registration order.
    pub async fn query(
        &self,
        text: &str,
        top_k: usize,
    ) -> Result<Vec<ScoredDocument>, KnowledgeError> {
        if top_k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self
            .embedder
            .embed(&[text.to_string()])
            .await?
            .pop()
            .ok_or(EmbedError::CountMismatch {
                expected: 1,
                got: 0,
            })?;

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine_similarity(&query_vector, &e.vector)))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(top_k);

        debug!(
            "Knowledge query matched {} documents ({})",
            scored.len(),
            self.embedder.model_name()
        );
        Ok(scored
            .into_iter()
            .map(|(i, score)| ScoredDocument {
                document: self.entries[i].document.clone(),
                score,
            })
            .collect())
    }

    #[cfg(test)]
    pub fn get(&self, id: &str) -> Option<&Document> {
        self.entries
            .iter()
            .map(|e| &e.document)
            .find(|d| d.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Registers the README document followed by one document per project.
/// A project whose name collides with an earlier id is skipped.
pub async fn register_candidate(
    store: &mut KnowledgeStore,
    profile: &CandidateProfile,
    projects: &[ProjectSummary],
) -> Result<(), KnowledgeError> {
    let readme_metadata = Metadata::from([
        ("type".to_string(), "README".to_string()),
        ("role".to_string(), profile.role.join(", ")),
        (
            "experience_duration".to_string(),
            profile.experience_duration.to_string(),
        ),
        ("experience".to_string(), profile.experience.clone()),
        ("skills".to_string(), profile.skills.join(", ")),
    ]);
    let mut documents = vec![Document {
        id: README_DOCUMENT_ID.to_string(),
        text: profile.description.clone(),
        metadata: readme_metadata,
    }];
    let mut seen: HashSet<String> = HashSet::from([README_DOCUMENT_ID.to_string()]);

    for project in projects {
        if !seen.insert(project.name.clone()) {
            warn!(
                "Skipping project '{}': a document with that id is already registered",
                project.name
            );
            continue;
        }
        let metadata = Metadata::from([
            ("type".to_string(), "Project".to_string()),
            ("project_name".to_string(), project.name.clone()),
            ("url".to_string(), project.url.clone()),
            (
                "primary_language".to_string(),
                project.primary_language.clone(),
            ),
            ("project_type".to_string(), project.project_type.clone()),
            (
                "main_technologies".to_string(),
                project.technologies.join(", "),
            ),
        ]);
        documents.push(Document {
            id: project.name.clone(),
            text: project.primary_goal.clone(),
            metadata,
        });
    }

    store.register_all(documents).await
}

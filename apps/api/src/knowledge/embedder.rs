//! Text embedders for the knowledge store.
//!
//! `FastEmbedder` runs a local sentence-embedding model (all-MiniLM-L6-v2 by
//! default) through fastembed's ONNX runtime. The model is downloaded once into
//! the cache directory. `HashingEmbedder` is a deterministic stand-in for tests.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("embedding model error: {0}")]
    Model(String),

    #[error("embedder returned {got} vectors for {expected} texts")]
    CountMismatch { expected: usize, got: usize },
}

/// Turns texts into fixed-length vectors, one per input. Vectors from one
/// embedder must be comparable with cosine similarity.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;

    fn model_name(&self) -> &str;
}

/// fastembed-backed embedder. Inference is CPU-bound and runs on the blocking pool.
pub struct FastEmbedder {
    model: Arc<Mutex<TextEmbedding>>,
    name: String,
}

impl FastEmbedder {
    /// Loads `model`, downloading it into `cache_dir` (or fastembed's default
    /// cache) on first use. Blocks; call from `spawn_blocking` in async code.
    pub fn new(model: EmbeddingModel, cache_dir: Option<PathBuf>) -> Result<Self, EmbedError> {
        let name = format!("{model:?}");
        let mut options = InitOptions::new(model).with_show_download_progress(false);
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(dir);
        }

        let embedding =
            TextEmbedding::try_new(options).map_err(|e| EmbedError::Model(e.to_string()))?;
        info!("Embedding model loaded: {}", name);
        Ok(Self {
            model: Arc::new(Mutex::new(embedding)),
            name,
        })
    }

    /// The default sentence model, all-MiniLM-L6-v2 (384 dimensions).
    pub fn mini_lm(cache_dir: Option<PathBuf>) -> Result<Self, EmbedError> {
        Self::new(EmbeddingModel::AllMiniLML6V2, cache_dir)
    }
}

#[async_trait]
impl Embedder for FastEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = Arc::clone(&self.model);
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || {
            let mut model = model
                .lock()
                .map_err(|_| EmbedError::Model("embedding model lock poisoned".to_string()))?;
            model
                .embed(texts, None)
                .map_err(|e| EmbedError::Model(e.to_string()))
        })
        .await
        .map_err(|e| EmbedError::Model(format!("embedding task failed: {e}")))?
    }

    fn model_name(&self) -> &str {
        &self.name
    }
}

/// Cosine similarity of two vectors; 0.0 when either is all zeros.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
pub use hashing::HashingEmbedder;

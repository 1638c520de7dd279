use crate::config::Config;
use crate::pipeline::LetterPipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: LetterPipeline,
    pub config: Config,
}

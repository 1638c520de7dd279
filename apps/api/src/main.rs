mod config;
mod errors;
mod extraction;
mod fetch;
mod github;
mod knowledge;
mod letter;
mod llm_client;
mod pipeline;
mod retry;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::fetch::HttpPageFetcher;
use crate::github::GithubClient;
use crate::knowledge::embedder::{Embedder, FastEmbedder};
use crate::llm_client::LlmClient;
use crate::pipeline::LetterPipeline;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing credentials)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting letters v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = LlmClient::new(config.llm.clone(), config.llm_retry())?;
    info!("LLM client initialized (model: {})", llm.model());

    // Initialize page fetcher and GitHub client
    let fetcher = HttpPageFetcher::new(config.fetch_retry())?;
    let github = GithubClient::new(config.github.clone(), config.fetch_retry())?;
    info!(
        "GitHub client initialized ({}, up to {} repository pages, {} attempts per call)",
        config.github.api_url,
        config.github.max_repo_pages,
        config.fetch_retry().max_attempts()
    );

    // Load the sentence-embedding model (downloaded on first start)
    let cache_dir = config.embedding_cache_dir.clone();
    let embedder = tokio::task::spawn_blocking(move || FastEmbedder::mini_lm(cache_dir)).await??;
    info!("Embedder initialized (model: {})", embedder.model_name());

    let pipeline = LetterPipeline::new(
        Arc::new(llm),
        Arc::new(fetcher),
        Arc::new(github),
        Arc::new(embedder),
    );

    // Build app state
    let state = AppState {
        pipeline,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

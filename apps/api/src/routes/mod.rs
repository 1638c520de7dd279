pub mod health;
pub mod letters;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(letters::index_handler))
        .route("/health", get(health::health_handler))
        .route("/letters", post(letters::handle_letter_form))
        .route("/api/v1/letters", post(letters::handle_letter_json))
        .with_state(state)
}

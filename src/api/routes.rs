use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers::{get_rankings, health, refill_funding};
use super::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/rankings", get(get_rankings))
        .route("/jobs/refill-funding", post(refill_funding))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

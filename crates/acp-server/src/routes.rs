use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::handlers::{agents, agreements, discovery, escrows, health, predictions, services};
use crate::state::AppState;

pub fn build(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health::node_info))
        .route("/health", get(health::health))
        .route("/agents", post(agents::register))
        .route("/agents/search", get(agents::search))
        .route("/agents/{id}", get(agents::get))
        .route("/agents/{id}/services", post(services::list_service))
        .route("/services/search", get(services::search))
        .route("/services/{id}/ratings", post(services::rate))
        .route("/agreements", post(agreements::create))
        .route("/agreements/{id}", get(agreements::get))
        .route("/agreements/{id}/sign", post(agreements::sign))
        .route("/agreements/{id}/amend", post(agreements::amend))
        .route("/escrows", post(escrows::create))
        .route("/escrows/{id}", get(escrows::get))
        .route("/escrows/{id}/fund", post(escrows::fund))
        .route("/escrows/{id}/release", post(escrows::release))
        .route("/escrows/{id}/refund", post(escrows::refund))
        .route("/escrows/{id}/dispute", post(escrows::dispute))
        .route("/escrows/{id}/resolve", post(escrows::resolve))
        .route("/discovery/search", post(discovery::search))
        .route("/discovery/negotiate", post(discovery::negotiate_handler))
        .route("/predictions", post(predictions::submit))
        .route("/predictions/leaderboard", get(predictions::leaderboard))
        .route("/predictions/{market}/resolve", post(predictions::resolve))
        .route("/predictions/{agent_id}/stats", get(predictions::stats))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

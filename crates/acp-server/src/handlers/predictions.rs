use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::Json;
use metrics::{counter, histogram};
use serde::Deserialize;

use acp_types::ids::AgentId;
use acp_types::prediction::{Prediction, PredictionStats};

use crate::error::{error_code, ApiError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SubmitPredictionRequest {
    pub agent_id: String,
    pub market_slug: String,
    pub probability: f64,
    pub rationale: String,
}

pub async fn submit(State(state): State<Arc<AppState>>, Json(req): Json<SubmitPredictionRequest>) -> Result<Json<Prediction>, ApiError> {
    let start = Instant::now();
    counter!("acp_requests_total", "endpoint" => "predictions_submit").increment(1);

    let result = state
        .predictions
        .submit(AgentId::from(req.agent_id), req.market_slug, req.probability, req.rationale)
        .await;
    match &result {
        Ok(_) => histogram!("acp_request_duration_seconds", "endpoint" => "predictions_submit").record(start.elapsed().as_secs_f64()),
        Err(e) => {
            counter!("acp_errors_total", "endpoint" => "predictions_submit", "error" => error_code(e)).increment(1);
        }
    }
    Ok(Json(result?))
}

#[derive(Deserialize)]
pub struct ResolveMarketRequest {
    pub market_slug: String,
    pub outcome: u8,
}

pub async fn resolve(State(state): State<Arc<AppState>>, Json(req): Json<ResolveMarketRequest>) -> Result<Json<Vec<PredictionStats>>, ApiError> {
    let start = Instant::now();
    counter!("acp_requests_total", "endpoint" => "predictions_resolve").increment(1);

    let result = state.predictions.resolve(&req.market_slug, req.outcome).await;
    match &result {
        Ok(_) => histogram!("acp_request_duration_seconds", "endpoint" => "predictions_resolve").record(start.elapsed().as_secs_f64()),
        Err(e) => {
            counter!("acp_errors_total", "endpoint" => "predictions_resolve", "error" => error_code(e)).increment(1);
        }
    }
    Ok(Json(result?))
}

pub async fn stats(State(state): State<Arc<AppState>>, Path(agent_id): Path<String>) -> Result<Json<PredictionStats>, ApiError> {
    let start = Instant::now();
    counter!("acp_requests_total", "endpoint" => "predictions_stats").increment(1);

    let result = state.predictions.stats(&AgentId::from(agent_id)).await;
    match &result {
        Ok(_) => histogram!("acp_request_duration_seconds", "endpoint" => "predictions_stats").record(start.elapsed().as_secs_f64()),
        Err(e) => {
            counter!("acp_errors_total", "endpoint" => "predictions_stats", "error" => error_code(e)).increment(1);
        }
    }
    Ok(Json(result?))
}

pub async fn leaderboard(State(state): State<Arc<AppState>>) -> Result<Json<Vec<PredictionStats>>, ApiError> {
    let start = Instant::now();
    counter!("acp_requests_total", "endpoint" => "predictions_leaderboard").increment(1);

    let result = state.predictions.leaderboard().await;
    match &result {
        Ok(_) => histogram!("acp_request_duration_seconds", "endpoint" => "predictions_leaderboard").record(start.elapsed().as_secs_f64()),
        Err(e) => {
            counter!("acp_errors_total", "endpoint" => "predictions_leaderboard", "error" => error_code(e)).increment(1);
        }
    }
    Ok(Json(result?))
}

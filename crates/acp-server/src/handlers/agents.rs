use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::Json;
use metrics::{counter, histogram};
use serde::Deserialize;

use acp_registry::AgentFilters;
use acp_types::agent::{Agent, AgentProfile};
use acp_types::ids::AgentId;

use crate::error::{error_code, ApiError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RegisterAgentRequest {
    pub address: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    pub metadata: Option<serde_json::Value>,
}

pub async fn register(State(state): State<Arc<AppState>>, Json(req): Json<RegisterAgentRequest>) -> Result<Json<Agent>, ApiError> {
    let start = Instant::now();
    counter!("acp_requests_total", "endpoint" => "agents_register").increment(1);

    let profile = AgentProfile {
        address: req.address.into(),
        name: req.name,
        description: req.description,
        capabilities: req.capabilities,
        metadata: req.metadata,
    };
    let result = state.registry.register(profile).await;
    match &result {
        Ok(_) => histogram!("acp_request_duration_seconds", "endpoint" => "agents_register").record(start.elapsed().as_secs_f64()),
        Err(e) => {
            counter!("acp_errors_total", "endpoint" => "agents_register", "error" => error_code(e)).increment(1);
        }
    }
    Ok(Json(result?))
}

pub async fn get(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Result<Json<Agent>, ApiError> {
    let start = Instant::now();
    counter!("acp_requests_total", "endpoint" => "agents_get").increment(1);

    let result = state.registry.get(&AgentId::from(id)).await;
    match &result {
        Ok(_) => histogram!("acp_request_duration_seconds", "endpoint" => "agents_get").record(start.elapsed().as_secs_f64()),
        Err(e) => {
            counter!("acp_errors_total", "endpoint" => "agents_get", "error" => error_code(e)).increment(1);
        }
    }
    Ok(Json(result?))
}

#[derive(Deserialize)]
pub struct AgentSearchQuery {
    pub capability: Option<String>,
    pub min_rating: Option<f64>,
    pub q: Option<String>,
}

pub async fn search(State(state): State<Arc<AppState>>, Query(query): Query<AgentSearchQuery>) -> Result<Json<Vec<Agent>>, ApiError> {
    let start = Instant::now();
    counter!("acp_requests_total", "endpoint" => "agents_search").increment(1);

    let filters = AgentFilters {
        capability: query.capability,
        min_rating: query.min_rating,
        query: query.q,
    };
    let result = state.registry.search_agents(filters).await;
    match &result {
        Ok(_) => histogram!("acp_request_duration_seconds", "endpoint" => "agents_search").record(start.elapsed().as_secs_f64()),
        Err(e) => {
            counter!("acp_errors_total", "endpoint" => "agents_search", "error" => error_code(e)).increment(1);
        }
    }
    Ok(Json(result?))
}

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::Json;
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};

use acp_discovery::{discover, negotiate, DiscoveryMatch, DiscoveryRequest, NegotiationOutcome};
use acp_registry::ServiceFilters;
use acp_types::agreement::{Agreement, Term};
use acp_types::service::CapabilityCategory;

use crate::error::{error_code, ApiError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SearchRequest {
    pub need: String,
    #[serde(default)]
    pub categories: Vec<CapabilityCategory>,
    #[serde(default)]
    pub required_capabilities: Vec<String>,
    #[serde(default)]
    pub preferred_capabilities: Vec<String>,
    pub max_price: Option<rust_decimal::Decimal>,
    pub min_rating: Option<f64>,
    pub deadline: Option<i64>,
    pub buyer: String,
}

/// a `(agent, service)` candidate pool drawn from the full service
/// directory; scoring and filtering both happen in `acp_discovery`, so the
/// handler's only job is to assemble the pairs it scores over.
async fn candidate_pool(state: &AppState) -> Result<Vec<(acp_types::agent::Agent, acp_types::service::ServiceListing)>, ApiError> {
    let services = state.registry.search_services(ServiceFilters::default()).await?;
    let mut pool = Vec::with_capacity(services.len());
    for service in services {
        if let Ok(agent) = state.registry.get(&service.agent_id).await {
            pool.push((agent, service));
        }
    }
    Ok(pool)
}

pub async fn search(State(state): State<Arc<AppState>>, Json(req): Json<SearchRequest>) -> Result<Json<Vec<DiscoveryMatchResponse>>, ApiError> {
    let start = Instant::now();
    counter!("acp_requests_total", "endpoint" => "discovery_search").increment(1);

    let request = DiscoveryRequest {
        need: req.need,
        categories: req.categories,
        required_capabilities: req.required_capabilities,
        preferred_capabilities: req.preferred_capabilities,
        max_price: req.max_price,
        min_rating: req.min_rating,
        deadline: req.deadline,
        buyer: req.buyer,
    };

    let pool = match candidate_pool(&state).await {
        Ok(pool) => pool,
        Err(e) => {
            counter!("acp_errors_total", "endpoint" => "discovery_search", "error" => error_code(&e.0)).increment(1);
            return Err(e);
        }
    };
    let matches = discover(&pool, &request);
    histogram!("acp_request_duration_seconds", "endpoint" => "discovery_search").record(start.elapsed().as_secs_f64());
    Ok(Json(matches.into_iter().map(DiscoveryMatchResponse::from).collect()))
}

#[derive(Serialize)]
pub struct DiscoveryMatchResponse {
    pub agent: acp_types::agent::Agent,
    pub service: acp_types::service::ServiceListing,
    pub score: f64,
    pub reasons: Vec<String>,
}

impl From<DiscoveryMatch> for DiscoveryMatchResponse {
    fn from(m: DiscoveryMatch) -> Self {
        Self {
            agent: m.agent,
            service: m.service,
            score: m.score,
            reasons: m.reasons,
        }
    }
}

#[derive(Deserialize)]
pub struct NegotiateRequest {
    pub need: String,
    #[serde(default)]
    pub categories: Vec<CapabilityCategory>,
    #[serde(default)]
    pub required_capabilities: Vec<String>,
    pub service_id: String,
    pub buyer: String,
    pub proposed_price: Option<rust_decimal::Decimal>,
    pub proposed_deadline: Option<i64>,
    #[serde(default)]
    pub terms: Vec<Term>,
}

#[derive(Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NegotiateResponse {
    Accepted { agreement: Agreement },
    Countered { price: rust_decimal::Decimal, deadline: i64, terms: Vec<Term> },
}

pub async fn negotiate_handler(State(state): State<Arc<AppState>>, Json(req): Json<NegotiateRequest>) -> Result<Json<NegotiateResponse>, ApiError> {
    let start = Instant::now();
    counter!("acp_requests_total", "endpoint" => "discovery_negotiate").increment(1);

    let result = negotiate_inner(&state, req).await;
    match &result {
        Ok(_) => histogram!("acp_request_duration_seconds", "endpoint" => "discovery_negotiate").record(start.elapsed().as_secs_f64()),
        Err(e) => {
            counter!("acp_errors_total", "endpoint" => "discovery_negotiate", "error" => error_code(&e.0)).increment(1);
        }
    }
    Ok(Json(result?))
}

async fn negotiate_inner(state: &AppState, req: NegotiateRequest) -> Result<NegotiateResponse, ApiError> {
    let request = DiscoveryRequest {
        need: req.need,
        categories: req.categories,
        required_capabilities: req.required_capabilities,
        preferred_capabilities: vec![],
        max_price: None,
        min_rating: None,
        deadline: None,
        buyer: req.buyer.clone(),
    };

    let pool = candidate_pool(state).await?;
    let matched = discover(&pool, &request)
        .into_iter()
        .find(|m| m.service.id.as_str() == req.service_id)
        .ok_or_else(|| ApiError(acp_types::AcpError::not_found(format!("no matching service {}", req.service_id))))?;

    let outcome = negotiate(&matched, &req.buyer, req.proposed_price, req.proposed_deadline, req.terms)?;
    let response = match outcome {
        NegotiationOutcome::Accepted(agreement) => NegotiateResponse::Accepted { agreement },
        NegotiationOutcome::Countered(offer) => NegotiateResponse::Countered {
            price: offer.price,
            deadline: offer.deadline,
            terms: offer.terms,
        },
    };
    Ok(response)
}

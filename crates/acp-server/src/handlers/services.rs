use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::Json;
use metrics::{counter, histogram};
use serde::Deserialize;

use acp_registry::ServiceFilters;
use acp_types::ids::{AgentId, ServiceId};
use acp_types::service::{Capability, CapabilityCategory, Pricing, PricingModel, Rating, ServiceLevelAgreement, ServiceListing};

use crate::error::{error_code, ApiError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListServiceRequest {
    pub category: CapabilityCategory,
    pub name: String,
    pub description: String,
    pub pricing_model: PricingModel,
    pub amount: rust_decimal::Decimal,
    pub currency: String,
    pub sla: Option<ServiceLevelAgreement>,
    #[serde(default)]
    pub tags: Vec<String>,
}

pub async fn list_service(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
    Json(req): Json<ListServiceRequest>,
) -> Result<Json<ServiceListing>, ApiError> {
    let start = Instant::now();
    counter!("acp_requests_total", "endpoint" => "services_list").increment(1);

    let listing = ServiceListing {
        id: ServiceId::new(),
        agent_id: AgentId::from(String::new()),
        capability: Capability {
            category: req.category,
            name: req.name,
            description: req.description,
        },
        pricing: Pricing {
            model: req.pricing_model,
            amount: req.amount,
            currency: req.currency,
        },
        sla: req.sla,
        tags: req.tags,
        enabled: true,
        created_at: 0,
        updated_at: 0,
    };

    let result = state.registry.list_service(&AgentId::from(agent_id), listing).await;
    match &result {
        Ok(_) => histogram!("acp_request_duration_seconds", "endpoint" => "services_list").record(start.elapsed().as_secs_f64()),
        Err(e) => {
            counter!("acp_errors_total", "endpoint" => "services_list", "error" => error_code(e)).increment(1);
        }
    }
    Ok(Json(result?))
}

#[derive(Deserialize)]
pub struct ServiceSearchQuery {
    pub category: Option<CapabilityCategory>,
    pub capability: Option<String>,
    pub max_price: Option<rust_decimal::Decimal>,
    pub min_rating: Option<f64>,
    pub q: Option<String>,
}

pub async fn search(State(state): State<Arc<AppState>>, Query(query): Query<ServiceSearchQuery>) -> Result<Json<Vec<ServiceListing>>, ApiError> {
    let start = Instant::now();
    counter!("acp_requests_total", "endpoint" => "services_search").increment(1);

    let filters = ServiceFilters {
        category: query.category,
        capability: query.capability,
        max_price: query.max_price,
        min_rating: query.min_rating,
        query: query.q,
    };
    let result = state.registry.search_services(filters).await;
    match &result {
        Ok(_) => histogram!("acp_request_duration_seconds", "endpoint" => "services_search").record(start.elapsed().as_secs_f64()),
        Err(e) => {
            counter!("acp_errors_total", "endpoint" => "services_search", "error" => error_code(e)).increment(1);
        }
    }
    Ok(Json(result?))
}

#[derive(Deserialize)]
pub struct RateServiceRequest {
    pub rater_address: String,
    pub rating: u8,
    pub review: Option<String>,
}

pub async fn rate(
    State(state): State<Arc<AppState>>,
    Path(service_id): Path<String>,
    Json(req): Json<RateServiceRequest>,
) -> Result<Json<Rating>, ApiError> {
    let start = Instant::now();
    counter!("acp_requests_total", "endpoint" => "services_rate").increment(1);

    let result = state
        .registry
        .rate_service(&ServiceId::from(service_id), &req.rater_address, req.rating, req.review)
        .await;
    match &result {
        Ok(_) => histogram!("acp_request_duration_seconds", "endpoint" => "services_rate").record(start.elapsed().as_secs_f64()),
        Err(e) => {
            counter!("acp_errors_total", "endpoint" => "services_rate", "error" => error_code(e)).increment(1);
        }
    }
    Ok(Json(result?))
}

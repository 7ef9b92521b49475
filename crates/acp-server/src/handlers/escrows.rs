use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::Json;
use metrics::{counter, histogram};
use serde::Deserialize;

use acp_escrow::{CreateEscrowParams, ReleaseTo};
use acp_types::escrow::{Condition, Escrow};
use acp_types::ids::EscrowId;
use acp_types::AcpError;

use crate::error::{error_code, ApiError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateEscrowRequest {
    pub chain: String,
    pub buyer: String,
    pub seller: String,
    pub arbiter: Option<String>,
    pub amount: rust_decimal::Decimal,
    pub token_mint: Option<String>,
    #[serde(default)]
    pub release_conditions: Vec<Condition>,
    #[serde(default)]
    pub refund_conditions: Vec<Condition>,
    pub expires_at: i64,
    pub description: Option<String>,
    pub agreement_hash: Option<String>,
}

pub async fn create(State(state): State<Arc<AppState>>, Json(req): Json<CreateEscrowRequest>) -> Result<Json<Escrow>, ApiError> {
    let start = Instant::now();
    counter!("acp_requests_total", "endpoint" => "escrows_create").increment(1);

    let result = state
        .escrows
        .create(CreateEscrowParams {
            chain: req.chain,
            buyer: req.buyer,
            seller: req.seller,
            arbiter: req.arbiter,
            amount: req.amount,
            token_mint: req.token_mint,
            release_conditions: req.release_conditions,
            refund_conditions: req.refund_conditions,
            expires_at: req.expires_at,
            description: req.description,
            agreement_hash: req.agreement_hash,
        })
        .await;
    match &result {
        Ok(_) => histogram!("acp_request_duration_seconds", "endpoint" => "escrows_create").record(start.elapsed().as_secs_f64()),
        Err(e) => {
            counter!("acp_errors_total", "endpoint" => "escrows_create", "error" => error_code(e)).increment(1);
        }
    }
    Ok(Json(result?))
}

pub async fn get(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Result<Json<Escrow>, ApiError> {
    let start = Instant::now();
    counter!("acp_requests_total", "endpoint" => "escrows_get").increment(1);

    let result = state.escrows.get(&EscrowId::from(id)).await;
    match &result {
        Ok(_) => histogram!("acp_request_duration_seconds", "endpoint" => "escrows_get").record(start.elapsed().as_secs_f64()),
        Err(e) => {
            counter!("acp_errors_total", "endpoint" => "escrows_get", "error" => error_code(e)).increment(1);
        }
    }
    Ok(Json(result?))
}

#[derive(Deserialize)]
pub struct AuthorizedAction {
    pub authorizer: String,
}

pub async fn fund(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<AuthorizedAction>,
) -> Result<Json<Escrow>, ApiError> {
    let start = Instant::now();
    counter!("acp_requests_total", "endpoint" => "escrows_fund").increment(1);

    let result = state.escrows.fund(&EscrowId::from(id), &req.authorizer).await;
    match &result {
        Ok(_) => histogram!("acp_request_duration_seconds", "endpoint" => "escrows_fund").record(start.elapsed().as_secs_f64()),
        Err(e) => {
            counter!("acp_errors_total", "endpoint" => "escrows_fund", "error" => error_code(e)).increment(1);
        }
    }
    Ok(Json(result?))
}

pub async fn release(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<AuthorizedAction>,
) -> Result<Json<Escrow>, ApiError> {
    let start = Instant::now();
    counter!("acp_requests_total", "endpoint" => "escrows_release").increment(1);

    let result = state.escrows.release(&EscrowId::from(id), &req.authorizer).await;
    match &result {
        Ok(_) => histogram!("acp_request_duration_seconds", "endpoint" => "escrows_release").record(start.elapsed().as_secs_f64()),
        Err(e) => {
            counter!("acp_errors_total", "endpoint" => "escrows_release", "error" => error_code(e)).increment(1);
        }
    }
    Ok(Json(result?))
}

pub async fn refund(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<AuthorizedAction>,
) -> Result<Json<Escrow>, ApiError> {
    let start = Instant::now();
    counter!("acp_requests_total", "endpoint" => "escrows_refund").increment(1);

    let result = state.escrows.refund(&EscrowId::from(id), &req.authorizer).await;
    match &result {
        Ok(_) => histogram!("acp_request_duration_seconds", "endpoint" => "escrows_refund").record(start.elapsed().as_secs_f64()),
        Err(e) => {
            counter!("acp_errors_total", "endpoint" => "escrows_refund", "error" => error_code(e)).increment(1);
        }
    }
    Ok(Json(result?))
}

pub async fn dispute(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<AuthorizedAction>,
) -> Result<Json<Escrow>, ApiError> {
    let start = Instant::now();
    counter!("acp_requests_total", "endpoint" => "escrows_dispute").increment(1);

    let result = state.escrows.dispute(&EscrowId::from(id), &req.authorizer).await;
    match &result {
        Ok(_) => histogram!("acp_request_duration_seconds", "endpoint" => "escrows_dispute").record(start.elapsed().as_secs_f64()),
        Err(e) => {
            counter!("acp_errors_total", "endpoint" => "escrows_dispute", "error" => error_code(e)).increment(1);
        }
    }
    Ok(Json(result?))
}

#[derive(Deserialize)]
pub struct ResolveDisputeRequest {
    pub authorizer: String,
    pub release_to: String,
}

pub async fn resolve(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ResolveDisputeRequest>,
) -> Result<Json<Escrow>, ApiError> {
    let start = Instant::now();
    counter!("acp_requests_total", "endpoint" => "escrows_resolve").increment(1);

    let release_to = match req.release_to.as_str() {
        "buyer" => ReleaseTo::Buyer,
        "seller" => ReleaseTo::Seller,
        other => {
            counter!("acp_errors_total", "endpoint" => "escrows_resolve", "error" => "validation_error").increment(1);
            return Err(ApiError(AcpError::ValidationError(format!("release_to must be buyer or seller, got {other}"))));
        }
    };
    let result = state.escrows.resolve_dispute(&EscrowId::from(id), &req.authorizer, release_to).await;
    match &result {
        Ok(_) => histogram!("acp_request_duration_seconds", "endpoint" => "escrows_resolve").record(start.elapsed().as_secs_f64()),
        Err(e) => {
            counter!("acp_errors_total", "endpoint" => "escrows_resolve", "error" => error_code(e)).increment(1);
        }
    }
    Ok(Json(result?))
}

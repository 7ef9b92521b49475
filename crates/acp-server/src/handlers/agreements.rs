use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::Json;
use ed25519_dalek::SigningKey;
use metrics::{counter, histogram};
use serde::Deserialize;

use acp_types::agreement::{Agreement, Party, Term};
use acp_types::ids::AgreementId;
use acp_types::AcpError;

use crate::error::{error_code, ApiError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateAgreementRequest {
    pub title: String,
    pub description: String,
    pub parties: Vec<Party>,
    pub terms: Vec<Term>,
    pub total_value: Option<rust_decimal::Decimal>,
    pub currency: Option<String>,
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
}

pub async fn create(State(state): State<Arc<AppState>>, Json(req): Json<CreateAgreementRequest>) -> Result<Json<Agreement>, ApiError> {
    let start = Instant::now();
    counter!("acp_requests_total", "endpoint" => "agreements_create").increment(1);

    let result = state
        .agreements
        .create(
            req.title,
            req.description,
            req.parties,
            req.terms,
            req.total_value,
            req.currency,
            req.start_date,
            req.end_date,
        )
        .await;
    match &result {
        Ok(_) => histogram!("acp_request_duration_seconds", "endpoint" => "agreements_create").record(start.elapsed().as_secs_f64()),
        Err(e) => {
            counter!("acp_errors_total", "endpoint" => "agreements_create", "error" => error_code(e)).increment(1);
        }
    }
    Ok(Json(result?))
}

pub async fn get(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Result<Json<Agreement>, ApiError> {
    let start = Instant::now();
    counter!("acp_requests_total", "endpoint" => "agreements_get").increment(1);

    let result = state.agreements.get(&AgreementId::from(id)).await;
    match &result {
        Ok(_) => histogram!("acp_request_duration_seconds", "endpoint" => "agreements_get").record(start.elapsed().as_secs_f64()),
        Err(e) => {
            counter!("acp_errors_total", "endpoint" => "agreements_get", "error" => error_code(e)).increment(1);
        }
    }
    Ok(Json(result?))
}

/// a party signs with a raw ed25519 seed passed in the request body. ACP
/// is explicitly not a wallet custodian, so this endpoint only exists for
/// agents that hold their own keys and are willing to hand the seed over
/// the wire for a single signing operation; a production deployment in
/// front of a real wallet would replace this with a detached-signature
/// submission instead.
#[derive(Deserialize)]
pub struct SignAgreementRequest {
    pub signer_address: String,
    pub signing_key_hex: String,
}

pub async fn sign(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SignAgreementRequest>,
) -> Result<Json<Agreement>, ApiError> {
    let start = Instant::now();
    counter!("acp_requests_total", "endpoint" => "agreements_sign").increment(1);

    let seed_bytes = hex::decode(&req.signing_key_hex).map_err(|e| {
        counter!("acp_errors_total", "endpoint" => "agreements_sign", "error" => "validation_error").increment(1);
        ApiError(AcpError::ValidationError(format!("signing_key_hex: {e}")))
    })?;
    let seed: [u8; 32] = seed_bytes.try_into().map_err(|_| {
        counter!("acp_errors_total", "endpoint" => "agreements_sign", "error" => "validation_error").increment(1);
        ApiError(AcpError::ValidationError("signing_key_hex must decode to 32 bytes".into()))
    })?;
    let signing_key = SigningKey::from_bytes(&seed);

    let result = state.agreements.sign(&AgreementId::from(id), &req.signer_address, &signing_key).await;
    match &result {
        Ok(_) => histogram!("acp_request_duration_seconds", "endpoint" => "agreements_sign").record(start.elapsed().as_secs_f64()),
        Err(e) => {
            counter!("acp_errors_total", "endpoint" => "agreements_sign", "error" => error_code(e)).increment(1);
        }
    }
    Ok(Json(result?))
}

#[derive(Deserialize)]
pub struct AmendAgreementRequest {
    pub signer_address: String,
    #[serde(flatten)]
    pub changes: AmendChangesRequest,
}

#[derive(Deserialize, Default)]
pub struct AmendChangesRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub terms: Option<Vec<Term>>,
    pub total_value: Option<rust_decimal::Decimal>,
    pub currency: Option<String>,
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
}

pub async fn amend(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<AmendAgreementRequest>,
) -> Result<Json<Agreement>, ApiError> {
    let start = Instant::now();
    counter!("acp_requests_total", "endpoint" => "agreements_amend").increment(1);

    let changes = acp_agreements::AmendChanges {
        title: req.changes.title,
        description: req.changes.description,
        terms: req.changes.terms,
        total_value: req.changes.total_value,
        currency: req.changes.currency,
        start_date: req.changes.start_date,
        end_date: req.changes.end_date,
    };
    let result = state.agreements.amend(&AgreementId::from(id), changes, &req.signer_address).await;
    match &result {
        Ok(_) => histogram!("acp_request_duration_seconds", "endpoint" => "agreements_amend").record(start.elapsed().as_secs_f64()),
        Err(e) => {
            counter!("acp_errors_total", "endpoint" => "agreements_amend", "error" => error_code(e)).increment(1);
        }
    }
    Ok(Json(result?))
}

//! maps `AcpError` onto the HTTP boundary the way `ghettobox-vault`'s
//! handlers map `ghettobox::Error` into `(StatusCode, String)` — generalized
//! here to a typed `ErrorBody` since ACP callers need the error kind, not
//! just a message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use acp_types::AcpError;

#[derive(Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

pub struct ApiError(pub AcpError);

impl From<AcpError> for ApiError {
    fn from(e: AcpError) -> Self {
        Self(e)
    }
}

/// the same kind -> label mapping `into_response` uses for the body `code`,
/// exposed separately so handlers can tag `*_errors_total` with it without
/// constructing a response.
pub fn error_code(e: &AcpError) -> &'static str {
    match e {
        AcpError::NotFound(_) => "not_found",
        AcpError::Conflict(_) => "conflict",
        AcpError::Unauthorized(_) => "unauthorized",
        AcpError::InvalidState(_) => "invalid_state",
        AcpError::ValidationError(_) => "validation_error",
        AcpError::IntegrityError(_) => "integrity_error",
        AcpError::StoreError(_) => "store_error",
        AcpError::ExternalError(_) => "external_error",
        AcpError::Timeout(_) => "timeout",
        AcpError::ConfigError(_) => "config_error",
    }
}

fn status_for(e: &AcpError) -> StatusCode {
    match e {
        AcpError::NotFound(_) => StatusCode::NOT_FOUND,
        AcpError::Conflict(_) => StatusCode::CONFLICT,
        AcpError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        AcpError::InvalidState(_) => StatusCode::CONFLICT,
        AcpError::ValidationError(_) => StatusCode::BAD_REQUEST,
        AcpError::IntegrityError(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AcpError::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        AcpError::ExternalError(_) => StatusCode::BAD_GATEWAY,
        AcpError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        AcpError::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        let body = ErrorBody {
            code: error_code(&self.0),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

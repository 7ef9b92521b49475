//! shared error kinds for the ACP core
//!
//! every crate in the workspace returns `AcpError` so call sites across
//! component boundaries match on one type instead of converting between
//! per-crate error enums.

use thiserror::Error;

pub type AcpResult<T> = std::result::Result<T, AcpError>;

#[derive(Debug, Error)]
pub enum AcpError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("validation error: {0}")]
    ValidationError(String),

    #[error("integrity error: {0}")]
    IntegrityError(String),

    #[error("store error: {0}")]
    StoreError(String),

    #[error("external error: {0}")]
    ExternalError(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("config error: {0}")]
    ConfigError(String),
}

impl AcpError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(what: impl Into<String>) -> Self {
        Self::Conflict(what.into())
    }

    pub fn unauthorized(what: impl Into<String>) -> Self {
        Self::Unauthorized(what.into())
    }

    pub fn invalid_state(what: impl Into<String>) -> Self {
        Self::InvalidState(what.into())
    }

    pub fn validation(what: impl Into<String>) -> Self {
        Self::ValidationError(what.into())
    }
}

impl From<serde_json::Error> for AcpError {
    fn from(e: serde_json::Error) -> Self {
        AcpError::ValidationError(e.to_string())
    }
}

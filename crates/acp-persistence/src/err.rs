use acp_types::{AcpError, AcpResult};

/// maps a foreign `sqlx::Error` into the shared `AcpError::StoreError`
/// variant. a plain `From` impl isn't available here (both types are
/// foreign to this crate), so call sites use `.store_err()` instead of `?`.
pub trait MapStoreErr<T> {
    fn store_err(self) -> AcpResult<T>;
}

impl<T> MapStoreErr<T> for Result<T, sqlx::Error> {
    fn store_err(self) -> AcpResult<T> {
        self.map_err(|e| AcpError::StoreError(e.to_string()))
    }
}

impl<T> MapStoreErr<T> for Result<T, sqlx::migrate::MigrateError> {
    fn store_err(self) -> AcpResult<T> {
        self.map_err(|e| AcpError::StoreError(e.to_string()))
    }
}

//! row-level persistence seam for the vault
//!
//! the vault never talks to a database directly; it is handed an
//! implementation of this trait (backed by `acp-persistence` in the server
//! binary, or an in-memory fake in tests).

use acp_types::AcpResult;
use async_trait::async_trait;

#[async_trait]
pub trait VaultRowStore: Send + Sync {
    async fn put_envelope(&self, escrow_id: &str, envelope: &str) -> AcpResult<()>;
    async fn get_envelope(&self, escrow_id: &str) -> AcpResult<Option<String>>;
    async fn delete_envelope(&self, escrow_id: &str) -> AcpResult<()>;
}

/// in-memory row store, used by tests and by the in-process server profile.
#[derive(Default)]
pub struct InMemoryVaultStore {
    rows: tokio::sync::RwLock<std::collections::HashMap<String, String>>,
}

impl InMemoryVaultStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VaultRowStore for InMemoryVaultStore {
    async fn put_envelope(&self, escrow_id: &str, envelope: &str) -> AcpResult<()> {
        self.rows.write().await.insert(escrow_id.to_string(), envelope.to_string());
        Ok(())
    }

    async fn get_envelope(&self, escrow_id: &str) -> AcpResult<Option<String>> {
        Ok(self.rows.read().await.get(escrow_id).cloned())
    }

    async fn delete_envelope(&self, escrow_id: &str) -> AcpResult<()> {
        self.rows.write().await.remove(escrow_id);
        Ok(())
    }
}

//! adapts the `acp_escrows.encrypted_keypair` column to `acp_vault`'s
//! `VaultRowStore` seam, so the vault's cache-miss path reads/writes through
//! the same gateway as everything else.

use acp_types::AcpResult;
use acp_vault::store::VaultRowStore;
use async_trait::async_trait;
use sqlx::Row;

use crate::err::MapStoreErr;
use crate::gateway::Gateway;

pub struct GatewayVaultStore {
    gateway: Gateway,
}

impl GatewayVaultStore {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl VaultRowStore for GatewayVaultStore {
    async fn put_envelope(&self, escrow_id: &str, envelope: &str) -> AcpResult<()> {
        sqlx::query("UPDATE acp_escrows SET encrypted_keypair = ? WHERE id = ?")
            .bind(envelope)
            .bind(escrow_id)
            .execute(self.gateway.pool())
            .await
            .store_err()?;
        Ok(())
    }

    async fn get_envelope(&self, escrow_id: &str) -> AcpResult<Option<String>> {
        let row = sqlx::query("SELECT encrypted_keypair FROM acp_escrows WHERE id = ?")
            .bind(escrow_id)
            .fetch_optional(self.gateway.pool())
            .await
            .store_err()?;
        Ok(row.and_then(|r| r.try_get::<Option<String>, _>("encrypted_keypair").ok().flatten()))
    }

    async fn delete_envelope(&self, escrow_id: &str) -> AcpResult<()> {
        sqlx::query("UPDATE acp_escrows SET encrypted_keypair = NULL WHERE id = ?")
            .bind(escrow_id)
            .execute(self.gateway.pool())
            .await
            .store_err()?;
        Ok(())
    }
}

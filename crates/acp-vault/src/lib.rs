//! keypair vault: authenticated encryption and in-memory caching for the
//! ephemeral keypairs that own escrowed funds.
//!
//! the vault is the only component in the core that ever holds plaintext
//! key bytes. everything downstream (the chain adapter, the escrow engine)
//! receives either nothing or a signing callback — never the bytes
//! themselves. see `ghettobox::realm::software` in the retrieval pack for
//! the cache/store split this module generalizes.

pub mod crypto;
pub mod store;

use std::collections::HashMap;
use std::sync::Arc;

use acp_types::{AcpError, AcpResult};
use tokio::sync::RwLock;
use tracing::{debug, info};

use store::VaultRowStore;

pub struct KeypairVault {
    secret: String,
    store: Arc<dyn VaultRowStore>,
    cache: RwLock<HashMap<String, Vec<u8>>>,
}

impl KeypairVault {
    pub fn new(secret: impl Into<String>, store: Arc<dyn VaultRowStore>) -> Self {
        Self {
            secret: secret.into(),
            store,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// encrypt `keypair_bytes` and persist it keyed by `escrow_id`, caching
    /// the plaintext for subsequent `get` calls.
    pub async fn put(&self, escrow_id: &str, keypair_bytes: &[u8]) -> AcpResult<()> {
        let envelope = crypto::seal(&self.secret, keypair_bytes)?;
        self.store.put_envelope(escrow_id, &envelope).await?;
        self.cache
            .write()
            .await
            .insert(escrow_id.to_string(), keypair_bytes.to_vec());
        debug!(escrow_id, "vault: keypair stored");
        Ok(())
    }

    /// fetch the plaintext keypair for `escrow_id`, consulting the cache
    /// first and falling back to the store + decryption.
    pub async fn get(&self, escrow_id: &str) -> AcpResult<Option<Vec<u8>>> {
        if let Some(bytes) = self.cache.read().await.get(escrow_id) {
            return Ok(Some(bytes.clone()));
        }

        let Some(envelope) = self.store.get_envelope(escrow_id).await? else {
            return Ok(None);
        };
        let bytes = crypto::open(&self.secret, &envelope)?;
        self.cache
            .write()
            .await
            .insert(escrow_id.to_string(), bytes.clone());
        Ok(Some(bytes))
    }

    /// idempotently purge the cached and stored keypair for `escrow_id`.
    pub async fn clear(&self, escrow_id: &str) -> AcpResult<()> {
        self.cache.write().await.remove(escrow_id);
        self.store.delete_envelope(escrow_id).await?;
        info!(escrow_id, "vault: keypair cleared");
        Ok(())
    }

    /// true iff no plaintext is cached or stored for `escrow_id` — used to
    /// assert the terminal-escrow invariant in tests.
    pub async fn is_absent(&self, escrow_id: &str) -> AcpResult<bool> {
        Ok(self.get(escrow_id).await?.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::InMemoryVaultStore;

    fn vault() -> KeypairVault {
        KeypairVault::new("test-process-secret", Arc::new(InMemoryVaultStore::new()))
    }

    #[tokio::test]
    async fn put_get_roundtrip_byte_equal() {
        let v = vault();
        let key = b"ephemeral-escrow-keypair-bytes".to_vec();
        v.put("escrow-1", &key).await.unwrap();
        let got = v.get("escrow-1").await.unwrap().unwrap();
        assert_eq!(got, key);
    }

    #[tokio::test]
    async fn clear_then_get_is_absent() {
        let v = vault();
        v.put("escrow-1", b"bytes").await.unwrap();
        v.clear("escrow-1").await.unwrap();
        assert!(v.get("escrow-1").await.unwrap().is_none());
        assert!(v.is_absent("escrow-1").await.unwrap());
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let v = vault();
        v.clear("never-registered").await.unwrap();
        v.clear("never-registered").await.unwrap();
    }

    #[tokio::test]
    async fn get_falls_back_to_store_when_cache_cold() {
        let store = Arc::new(InMemoryVaultStore::new());
        let v1 = KeypairVault::new("shared-secret", store.clone());
        v1.put("escrow-9", b"key-bytes").await.unwrap();

        // a second vault instance over the same row store has a cold cache
        let v2 = KeypairVault::new("shared-secret", store);
        let got = v2.get("escrow-9").await.unwrap().unwrap();
        assert_eq!(got, b"key-bytes");
    }

    #[tokio::test]
    async fn missing_process_secret_is_config_error() {
        let v = KeypairVault::new("", Arc::new(InMemoryVaultStore::new()));
        let err = v.put("escrow-1", b"data").await.unwrap_err();
        assert!(matches!(err, AcpError::ConfigError(_)));
    }
}

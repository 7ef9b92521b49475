//! on-chain transfer boundary
//!
//! the escrow engine never touches a chain directly; it delegates through
//! this trait and records whatever signature comes back.

use acp_types::AcpResult;
use async_trait::async_trait;
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub struct TokenAccount {
    pub address: String,
    pub amount: Decimal,
}

#[async_trait]
pub trait ChainAdapter: Send + Sync {
    async fn transfer_native(&self, from: &str, to: &str, amount: Decimal) -> AcpResult<String>;
    async fn transfer_token(&self, from: &str, to: &str, mint: &str, amount: Decimal) -> AcpResult<String>;
    async fn get_native_balance(&self, address: &str) -> AcpResult<Decimal>;
    async fn get_or_create_token_account(&self, owner: &str, mint: &str) -> AcpResult<TokenAccount>;
}

/// in-memory adapter for tests and local development: moves balances
/// between addresses without touching any chain.
#[derive(Default)]
pub struct InMemoryChainAdapter {
    native: tokio::sync::Mutex<std::collections::HashMap<String, Decimal>>,
    counter: std::sync::atomic::AtomicU64,
}

impl InMemoryChainAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_native(&self, address: &str, amount: Decimal) {
        self.native.lock().await.insert(address.to_string(), amount);
    }

    fn next_signature(&self) -> String {
        let n = self.counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        format!("sig-{n}")
    }
}

#[async_trait]
impl ChainAdapter for InMemoryChainAdapter {
    async fn transfer_native(&self, from: &str, to: &str, amount: Decimal) -> AcpResult<String> {
        let mut balances = self.native.lock().await;
        let from_balance = balances.entry(from.to_string()).or_insert(Decimal::ZERO);
        *from_balance -= amount;
        *balances.entry(to.to_string()).or_insert(Decimal::ZERO) += amount;
        Ok(self.next_signature())
    }

    async fn transfer_token(&self, _from: &str, _to: &str, _mint: &str, _amount: Decimal) -> AcpResult<String> {
        Ok(self.next_signature())
    }

    async fn get_native_balance(&self, address: &str) -> AcpResult<Decimal> {
        Ok(*self.native.lock().await.get(address).unwrap_or(&Decimal::ZERO))
    }

    async fn get_or_create_token_account(&self, owner: &str, mint: &str) -> AcpResult<TokenAccount> {
        Ok(TokenAccount {
            address: format!("{owner}-{mint}-ata"),
            amount: Decimal::ZERO,
        })
    }
}

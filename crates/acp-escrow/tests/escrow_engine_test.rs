use std::sync::Arc;

use acp_escrow::{ConditionEvaluator, CreateEscrowParams, CustomConditionRegistry, EscrowEngine, InMemoryChainAdapter, OracleDispatcher, ReleaseTo};
use acp_persistence::{EscrowsRepo, Gateway};
use acp_types::escrow::EscrowStatus;
use acp_types::now_millis;
use acp_vault::store::InMemoryVaultStore;
use acp_vault::KeypairVault;

async fn engine() -> EscrowEngine {
    let gateway = Gateway::connect("sqlite::memory:").await.unwrap();
    let vault = Arc::new(KeypairVault::new("test-secret", Arc::new(InMemoryVaultStore::default())));
    let chain = Arc::new(InMemoryChainAdapter::new());
    let evaluator = ConditionEvaluator::new(OracleDispatcher::new(), CustomConditionRegistry::with_builtins());
    EscrowEngine::new(EscrowsRepo::new(gateway), vault, chain, evaluator)
}

fn params(arbiter: Option<&str>) -> CreateEscrowParams {
    CreateEscrowParams {
        chain: "solana".into(),
        buyer: "buyer-1".into(),
        seller: "seller-1".into(),
        arbiter: arbiter.map(str::to_string),
        amount: "100".parse().unwrap(),
        token_mint: None,
        release_conditions: vec![],
        refund_conditions: vec![],
        expires_at: now_millis() + 86_400_000,
        description: None,
        agreement_hash: None,
    }
}

#[tokio::test]
async fn fund_then_release_marks_released_with_both_signatures() {
    let engine = engine().await;
    let escrow = engine.create(params(None)).await.unwrap();
    assert!(engine.check_conditions(&escrow.id, acp_types::escrow::ConditionList::Release).await.unwrap());

    engine.fund(&escrow.id, "buyer-1").await.unwrap();
    let released = engine.release(&escrow.id, "buyer-1").await.unwrap();

    assert_eq!(released.status, EscrowStatus::Released);
    assert_eq!(released.tx_signatures.len(), 2);
}

#[tokio::test]
async fn only_buyer_can_fund() {
    let engine = engine().await;
    let escrow = engine.create(params(None)).await.unwrap();
    let err = engine.fund(&escrow.id, "seller-1").await.unwrap_err();
    assert!(matches!(err, acp_types::AcpError::Unauthorized(_)));
}

#[tokio::test]
async fn buyer_can_only_refund_after_expiry() {
    let engine = engine().await;
    let mut p = params(None);
    p.expires_at = now_millis() + 86_400_000;
    let escrow = engine.create(p).await.unwrap();
    engine.fund(&escrow.id, "buyer-1").await.unwrap();

    let err = engine.refund(&escrow.id, "buyer-1").await.unwrap_err();
    assert!(matches!(err, acp_types::AcpError::Unauthorized(_)));

    let refunded = engine.refund(&escrow.id, "seller-1").await.unwrap();
    assert_eq!(refunded.status, EscrowStatus::Refunded);
}

#[tokio::test]
async fn dispute_requires_arbiter_configured() {
    let engine = engine().await;
    let escrow = engine.create(params(None)).await.unwrap();
    engine.fund(&escrow.id, "buyer-1").await.unwrap();

    let err = engine.dispute(&escrow.id, "buyer-1").await.unwrap_err();
    assert!(matches!(err, acp_types::AcpError::InvalidState(_)));
}

#[tokio::test]
async fn resolve_dispute_releases_to_chosen_party() {
    let engine = engine().await;
    let escrow = engine.create(params(Some("arbiter-1"))).await.unwrap();
    engine.fund(&escrow.id, "buyer-1").await.unwrap();
    engine.dispute(&escrow.id, "buyer-1").await.unwrap();

    let resolved = engine.resolve_dispute(&escrow.id, "arbiter-1", ReleaseTo::Seller).await.unwrap();
    assert_eq!(resolved.status, EscrowStatus::Released);
}


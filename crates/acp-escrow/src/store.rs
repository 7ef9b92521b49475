use std::sync::Arc;

use acp_persistence::EscrowsRepo;
use acp_types::escrow::{Condition, ConditionList, Escrow, EscrowStatus};
use acp_types::ids::EscrowId;
use acp_types::keyed_lock::KeyedLock;
use acp_types::now_millis;
use acp_types::{AcpError, AcpResult};
use acp_vault::KeypairVault;
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use rust_decimal::Decimal;
use tracing::info;

use crate::chain_adapter::ChainAdapter;
use crate::conditions::ConditionEvaluator;

pub struct CreateEscrowParams {
    pub chain: String,
    pub buyer: String,
    pub seller: String,
    pub arbiter: Option<String>,
    pub amount: Decimal,
    pub token_mint: Option<String>,
    pub release_conditions: Vec<Condition>,
    pub refund_conditions: Vec<Condition>,
    pub expires_at: i64,
    pub description: Option<String>,
    pub agreement_hash: Option<String>,
}

/// who the arbiter releases funds to when resolving a dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseTo {
    Buyer,
    Seller,
}

pub struct EscrowEngine {
    repo: EscrowsRepo,
    vault: Arc<KeypairVault>,
    chain: Arc<dyn ChainAdapter>,
    evaluator: ConditionEvaluator,
    locks: KeyedLock<EscrowId>,
}

impl EscrowEngine {
    pub fn new(
        repo: EscrowsRepo,
        vault: Arc<KeypairVault>,
        chain: Arc<dyn ChainAdapter>,
        evaluator: ConditionEvaluator,
    ) -> Self {
        Self {
            repo,
            vault,
            chain,
            evaluator,
            locks: KeyedLock::new(),
        }
    }

    pub async fn create(&self, params: CreateEscrowParams) -> AcpResult<Escrow> {
        let signing_key = SigningKey::generate(&mut OsRng);
        let escrow_address = bs58::encode(signing_key.verifying_key().to_bytes()).into_string();

        let escrow = Escrow {
            id: EscrowId::new(),
            chain: params.chain,
            buyer: params.buyer,
            seller: params.seller,
            arbiter: params.arbiter,
            amount: params.amount,
            token_mint: params.token_mint,
            release_conditions: params.release_conditions,
            refund_conditions: params.refund_conditions,
            expires_at: params.expires_at,
            description: params.description,
            agreement_hash: params.agreement_hash,
            status: EscrowStatus::Pending,
            escrow_address,
            tx_signatures: vec![],
            metadata: None,
            created_at: now_millis(),
            funded_at: None,
            completed_at: None,
        };

        // the row must exist before the vault writes its envelope into it —
        // `GatewayVaultStore::put_envelope` is an UPDATE keyed on escrow id.
        self.repo.save(&escrow).await?;
        self.vault.put(escrow.id.as_str(), signing_key.to_bytes().as_slice()).await?;
        info!(escrow_id = %escrow.id, "escrow:create");
        Ok(escrow)
    }

    pub async fn get(&self, id: &EscrowId) -> AcpResult<Escrow> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| AcpError::not_found(format!("escrow {id} not found")))
    }

    pub async fn list(&self) -> AcpResult<Vec<Escrow>> {
        self.repo.list().await
    }

    pub async fn list_by_party(&self, party: &str) -> AcpResult<Vec<Escrow>> {
        self.repo.list_by_party(party).await
    }

    pub async fn check_conditions(&self, id: &EscrowId, which: ConditionList) -> AcpResult<bool> {
        let escrow = self.get(id).await?;
        Ok(self.evaluator.check_all(&escrow, escrow.conditions(which)).await)
    }

    pub async fn fund(&self, id: &EscrowId, authorizer: &str) -> AcpResult<Escrow> {
        let _guard = self.locks.lock(id.clone()).await;
        let mut escrow = self.get(id).await?;

        if escrow.status != EscrowStatus::Pending {
            return Err(AcpError::invalid_state(format!("cannot fund escrow in status {:?}", escrow.status)));
        }
        if authorizer != escrow.buyer {
            return Err(AcpError::unauthorized("only the buyer may fund an escrow"));
        }

        let signature = match &escrow.token_mint {
            Some(mint) => self.chain.transfer_token(&escrow.buyer, &escrow.escrow_address, mint, escrow.amount).await?,
            None => self.chain.transfer_native(&escrow.buyer, &escrow.escrow_address, escrow.amount).await?,
        };

        escrow.tx_signatures.push(signature);
        escrow.status = EscrowStatus::Funded;
        escrow.funded_at = Some(now_millis());
        self.repo.save(&escrow).await?;
        info!(escrow_id = %escrow.id, "escrow:fund");
        Ok(escrow)
    }

    pub async fn release(&self, id: &EscrowId, authorizer: &str) -> AcpResult<Escrow> {
        let _guard = self.locks.lock(id.clone()).await;
        let mut escrow = self.get(id).await?;

        if escrow.status != EscrowStatus::Funded {
            return Err(AcpError::invalid_state(format!("cannot release escrow in status {:?}", escrow.status)));
        }

        let is_arbiter = escrow.arbiter.as_deref() == Some(authorizer);
        if !is_arbiter {
            if authorizer != escrow.buyer {
                return Err(AcpError::unauthorized("release requires the buyer or the arbiter"));
            }
            let satisfied = self.evaluator.check_all(&escrow, &escrow.release_conditions).await;
            if !satisfied {
                return Err(AcpError::invalid_state("release conditions not satisfied"));
            }
        }

        let signature = self.transfer_out(&escrow, &escrow.seller.clone()).await?;
        escrow.tx_signatures.push(signature);
        escrow.status = EscrowStatus::Released;
        escrow.completed_at = Some(now_millis());
        self.repo.save(&escrow).await?;
        self.vault.clear(escrow.id.as_str()).await?;
        info!(escrow_id = %escrow.id, "escrow:release");
        Ok(escrow)
    }

    pub async fn refund(&self, id: &EscrowId, authorizer: &str) -> AcpResult<Escrow> {
        let _guard = self.locks.lock(id.clone()).await;
        let mut escrow = self.get(id).await?;

        if escrow.status != EscrowStatus::Funded {
            return Err(AcpError::invalid_state(format!("cannot refund escrow in status {:?}", escrow.status)));
        }

        let is_arbiter = escrow.arbiter.as_deref() == Some(authorizer);
        let is_seller = authorizer == escrow.seller;
        let is_buyer_after_expiry = authorizer == escrow.buyer && now_millis() > escrow.expires_at;
        if !(is_arbiter || is_seller || is_buyer_after_expiry) {
            return Err(AcpError::unauthorized(
                "refund requires the seller, the arbiter, or the buyer after expiry",
            ));
        }

        let signature = self.transfer_out(&escrow, &escrow.buyer.clone()).await?;
        escrow.tx_signatures.push(signature);
        escrow.status = EscrowStatus::Refunded;
        escrow.completed_at = Some(now_millis());
        self.repo.save(&escrow).await?;
        self.vault.clear(escrow.id.as_str()).await?;
        info!(escrow_id = %escrow.id, "escrow:refund");
        Ok(escrow)
    }

    pub async fn dispute(&self, id: &EscrowId, authorizer: &str) -> AcpResult<Escrow> {
        let _guard = self.locks.lock(id.clone()).await;
        let mut escrow = self.get(id).await?;

        if escrow.status != EscrowStatus::Funded {
            return Err(AcpError::invalid_state(format!("cannot dispute escrow in status {:?}", escrow.status)));
        }
        if escrow.arbiter.is_none() {
            return Err(AcpError::invalid_state("escrow has no arbiter configured"));
        }
        if authorizer != escrow.buyer && authorizer != escrow.seller {
            return Err(AcpError::unauthorized("dispute requires the buyer or the seller"));
        }

        escrow.status = EscrowStatus::Disputed;
        self.repo.save(&escrow).await?;
        info!(escrow_id = %escrow.id, "escrow:dispute");
        Ok(escrow)
    }

    pub async fn resolve_dispute(&self, id: &EscrowId, authorizer: &str, release_to: ReleaseTo) -> AcpResult<Escrow> {
        let _guard = self.locks.lock(id.clone()).await;
        let mut escrow = self.get(id).await?;

        if escrow.status != EscrowStatus::Disputed {
            return Err(AcpError::invalid_state(format!(
                "cannot resolve dispute for escrow in status {:?}",
                escrow.status
            )));
        }
        if escrow.arbiter.as_deref() != Some(authorizer) {
            return Err(AcpError::unauthorized("only the arbiter may resolve a dispute"));
        }

        let (recipient, final_status) = match release_to {
            ReleaseTo::Buyer => (escrow.buyer.clone(), EscrowStatus::Refunded),
            ReleaseTo::Seller => (escrow.seller.clone(), EscrowStatus::Released),
        };
        let signature = self.transfer_out(&escrow, &recipient).await?;
        escrow.tx_signatures.push(signature);
        escrow.status = final_status;
        escrow.completed_at = Some(now_millis());
        self.repo.save(&escrow).await?;
        self.vault.clear(escrow.id.as_str()).await?;
        info!(escrow_id = %escrow.id, to = %recipient, "escrow:resolve_dispute");
        Ok(escrow)
    }

    async fn transfer_out(&self, escrow: &Escrow, to: &str) -> AcpResult<String> {
        match &escrow.token_mint {
            Some(mint) => self.chain.transfer_token(&escrow.escrow_address, to, mint, escrow.amount).await,
            None => self.chain.transfer_native(&escrow.escrow_address, to, escrow.amount).await,
        }
    }
}

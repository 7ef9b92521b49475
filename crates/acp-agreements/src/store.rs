use std::collections::HashSet;

use acp_persistence::AgreementsRepo;
use acp_types::agreement::{Agreement, AgreementStatus, Party, Term};
use acp_types::ids::{AgreementId, EscrowId};
use acp_types::keyed_lock::KeyedLock;
use acp_types::now_millis;
use acp_types::{AcpError, AcpResult};
use base64::Engine;
use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::hashing::compute_hash;
use crate::signing;

/// fields an amendment may override; unset fields carry over from the
/// original unchanged.
#[derive(Debug, Clone, Default)]
pub struct AmendChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub terms: Option<Vec<Term>>,
    pub total_value: Option<rust_decimal::Decimal>,
    pub currency: Option<String>,
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ExportEnvelope {
    version: u32,
    #[serde(rename = "type")]
    kind: String,
    agreement: Agreement,
    exported_at: i64,
}

pub struct AgreementStore {
    repo: AgreementsRepo,
    locks: KeyedLock<AgreementId>,
}

impl AgreementStore {
    pub fn new(repo: AgreementsRepo) -> Self {
        Self {
            repo,
            locks: KeyedLock::new(),
        }
    }

    pub async fn create(
        &self,
        title: String,
        description: String,
        parties: Vec<Party>,
        terms: Vec<Term>,
        total_value: Option<rust_decimal::Decimal>,
        currency: Option<String>,
        start_date: Option<i64>,
        end_date: Option<i64>,
    ) -> AcpResult<Agreement> {
        let now = now_millis();
        let mut agreement = Agreement {
            id: AgreementId::new(),
            hash: String::new(),
            title,
            description,
            parties,
            terms,
            total_value,
            currency,
            start_date,
            end_date,
            escrow_id: None,
            version: 1,
            previous_version_hash: None,
            status: AgreementStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        agreement.hash = compute_hash(&agreement)?;
        self.repo.save(&agreement).await?;
        Ok(agreement)
    }

    pub async fn get(&self, id: &AgreementId) -> AcpResult<Agreement> {
        self.repo
            .get(id)
            .await?
            .ok_or_else(|| AcpError::not_found(format!("agreement {id} not found")))
    }

    pub async fn bind_escrow(&self, id: &AgreementId, escrow_id: EscrowId) -> AcpResult<Agreement> {
        let _guard = self.locks.lock(id.clone()).await;
        let mut agreement = self.get(id).await?;
        agreement.escrow_id = Some(escrow_id);
        agreement.updated_at = now_millis();
        self.repo.save(&agreement).await?;
        Ok(agreement)
    }

    pub async fn sign(&self, id: &AgreementId, signer_address: &str, signing_key: &SigningKey) -> AcpResult<Agreement> {
        let _guard = self.locks.lock(id.clone()).await;
        let mut agreement = self.get(id).await?;

        if !matches!(agreement.status, AgreementStatus::Draft | AgreementStatus::Proposed) {
            return Err(AcpError::invalid_state(format!(
                "cannot sign an agreement in status {:?}",
                agreement.status
            )));
        }

        let party = agreement
            .parties
            .iter_mut()
            .find(|p| p.address == signer_address)
            .ok_or_else(|| AcpError::unauthorized(format!("{signer_address} is not a party to this agreement")))?;

        if party.signature.is_some() {
            return Err(AcpError::conflict(format!("{signer_address} has already signed")));
        }

        let now = now_millis();
        let sig = signing::sign(&agreement.id, &agreement.hash, signer_address, now, signing_key)?;
        party.signature = Some(sig);
        party.signed_at = Some(now);

        let was_draft = matches!(agreement.status, AgreementStatus::Draft);
        let all_signed = agreement.parties.iter().all(|p| p.signature.is_some());

        if all_signed {
            agreement.status = AgreementStatus::Signed;
        } else if was_draft {
            agreement.status = AgreementStatus::Proposed;
        }
        agreement.updated_at = now;

        self.repo.save(&agreement).await?;
        info!(agreement_id = %agreement.id, signer = signer_address, status = ?agreement.status, "agreement:sign");
        Ok(agreement)
    }

    pub async fn verify_party_signature(&self, id: &AgreementId, signer_address: &str) -> AcpResult<bool> {
        let agreement = self.get(id).await?;
        let party = agreement
            .parties
            .iter()
            .find(|p| p.address == signer_address)
            .ok_or_else(|| AcpError::not_found(format!("{signer_address} is not a party")))?;
        let Some(sig) = &party.signature else {
            return Ok(false);
        };
        Ok(signing::verify(&agreement.id, &agreement.hash, sig))
    }

    pub async fn update_status(&self, id: &AgreementId, status: AgreementStatus) -> AcpResult<Agreement> {
        let _guard = self.locks.lock(id.clone()).await;
        let mut agreement = self.get(id).await?;

        if matches!(agreement.status, AgreementStatus::Completed | AgreementStatus::Cancelled) {
            return Err(AcpError::invalid_state(format!(
                "agreement {id} is in terminal status {:?}",
                agreement.status
            )));
        }
        if !matches!(
            status,
            AgreementStatus::Executed
                | AgreementStatus::Completed
                | AgreementStatus::Cancelled
                | AgreementStatus::Disputed
        ) {
            return Err(AcpError::invalid_state(
                "updateStatus only accepts executed, completed, cancelled, or disputed",
            ));
        }

        agreement.status = status;
        agreement.updated_at = now_millis();
        self.repo.save(&agreement).await?;
        Ok(agreement)
    }

    /// flips a term's completion flag; auto-transitions to `completed` once
    /// every term is complete.
    pub async fn complete_term(&self, id: &AgreementId, term_id: &str) -> AcpResult<Agreement> {
        let _guard = self.locks.lock(id.clone()).await;
        let mut agreement = self.get(id).await?;

        let term = agreement
            .terms
            .iter_mut()
            .find(|t| t.id == term_id)
            .ok_or_else(|| AcpError::not_found(format!("term {term_id} not found")))?;
        term.completed = true;

        if agreement.terms.iter().all(|t| t.completed) {
            agreement.status = AgreementStatus::Completed;
        }
        agreement.updated_at = now_millis();
        self.repo.save(&agreement).await?;
        Ok(agreement)
    }

    /// creates a new agreement version, bumping `version`, recording
    /// `previousVersionHash`, and clearing all signatures.
    pub async fn amend(&self, id: &AgreementId, changes: AmendChanges, signer_address: &str) -> AcpResult<Agreement> {
        let original = self.get(id).await?;

        if !original.parties.iter().any(|p| p.address == signer_address) {
            return Err(AcpError::unauthorized(format!(
                "{signer_address} is not a party to agreement {id}"
            )));
        }

        let now = now_millis();
        let mut amended = Agreement {
            id: AgreementId::new(),
            hash: String::new(),
            title: changes.title.unwrap_or_else(|| original.title.clone()),
            description: changes.description.unwrap_or_else(|| original.description.clone()),
            parties: original
                .parties
                .iter()
                .map(|p| Party {
                    address: p.address.clone(),
                    role: p.role.clone(),
                    signature: None,
                    signed_at: None,
                })
                .collect(),
            terms: changes.terms.unwrap_or_else(|| original.terms.clone()),
            total_value: changes.total_value.or(original.total_value),
            currency: changes.currency.or_else(|| original.currency.clone()),
            start_date: changes.start_date.or(original.start_date),
            end_date: changes.end_date.or(original.end_date),
            escrow_id: original.escrow_id.clone(),
            version: original.version + 1,
            previous_version_hash: Some(original.hash.clone()),
            status: AgreementStatus::Draft,
            created_at: now,
            updated_at: now,
        };
        amended.hash = compute_hash(&amended)?;

        self.repo.save(&amended).await?;
        info!(from = %original.id, to = %amended.id, version = amended.version, "agreement:amend");
        Ok(amended)
    }

    /// walks `previousVersionHash` back to a root, rejecting cycles and
    /// missing links.
    pub async fn verify_chain(&self, id: &AgreementId) -> AcpResult<Vec<Agreement>> {
        let mut chain = vec![self.get(id).await?];
        let mut seen_hashes: HashSet<String> = HashSet::new();
        seen_hashes.insert(chain[0].hash.clone());

        loop {
            let current = chain.last().unwrap();
            let Some(prev_hash) = current.previous_version_hash.clone() else {
                break;
            };
            if !seen_hashes.insert(prev_hash.clone()) {
                return Err(AcpError::IntegrityError("amendment chain has a cycle".into()));
            }
            let previous = self
                .repo
                .get_by_hash(&prev_hash)
                .await?
                .ok_or_else(|| AcpError::IntegrityError("broken amendment chain: missing link".into()))?;
            chain.push(previous);
        }
        Ok(chain)
    }

    pub fn export(&self, agreement: &Agreement) -> AcpResult<String> {
        let envelope = ExportEnvelope {
            version: 1,
            kind: "acp.agreement".into(),
            agreement: agreement.clone(),
            exported_at: now_millis(),
        };
        let json = serde_json::to_vec(&envelope)?;
        Ok(base64::engine::general_purpose::STANDARD.encode(json))
    }

    /// decodes the envelope, recomputes the hash, and rejects on mismatch.
    pub fn import(&self, encoded: &str) -> AcpResult<Agreement> {
        let json = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| AcpError::ValidationError(format!("not valid base64: {e}")))?;
        let envelope: ExportEnvelope =
            serde_json::from_slice(&json).map_err(|e| AcpError::ValidationError(format!("not a valid envelope: {e}")))?;

        let recomputed = compute_hash(&envelope.agreement)?;
        if recomputed != envelope.agreement.hash {
            return Err(AcpError::IntegrityError("imported agreement hash mismatch".into()));
        }
        Ok(envelope.agreement)
    }
}

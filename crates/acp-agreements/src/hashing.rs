//! canonical agreement hashing
//!
//! field order is fixed by `CanonicalAgreement`'s declaration order; serde_json
//! serializes struct fields in that order, and the `skip_serializing_if`
//! annotations omit absent fields rather than padding with `null`.

use acp_types::agreement::{Agreement, CanonicalAgreement, CanonicalParty};
use acp_types::AcpResult;
use sha2::{Digest, Sha256};

pub fn canonical_bytes(agreement: &Agreement) -> AcpResult<Vec<u8>> {
    let canonical = CanonicalAgreement {
        id: agreement.id.as_str(),
        title: &agreement.title,
        description: &agreement.description,
        parties: agreement
            .parties
            .iter()
            .map(|p| CanonicalParty {
                address: &p.address,
                role: &p.role,
            })
            .collect(),
        terms: &agreement.terms,
        total_value: agreement.total_value,
        currency: agreement.currency.as_deref(),
        start_date: agreement.start_date,
        end_date: agreement.end_date,
        escrow_id: agreement.escrow_id.as_ref().map(|e| e.as_str()),
        version: agreement.version,
        previous_version_hash: agreement.previous_version_hash.as_deref(),
    };
    Ok(serde_json::to_vec(&canonical)?)
}

pub fn compute_hash(agreement: &Agreement) -> AcpResult<String> {
    let bytes = canonical_bytes(agreement)?;
    let digest = Sha256::digest(&bytes);
    Ok(hex::encode(digest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use acp_types::agreement::{Agreement, AgreementStatus};
    use acp_types::ids::AgreementId;

    fn sample() -> Agreement {
        Agreement {
            id: AgreementId::from("agr-1"),
            hash: String::new(),
            title: "data feed subscription".into(),
            description: "monthly BTC price feed access".into(),
            parties: vec![],
            terms: vec![],
            total_value: None,
            currency: None,
            start_date: None,
            end_date: None,
            escrow_id: None,
            version: 1,
            previous_version_hash: None,
            status: AgreementStatus::Draft,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn hash_is_deterministic() {
        let a = sample();
        assert_eq!(compute_hash(&a).unwrap(), compute_hash(&a).unwrap());
    }

    #[test]
    fn hash_changes_with_title() {
        let a = sample();
        let mut b = sample();
        b.title = "different title".into();
        assert_ne!(compute_hash(&a).unwrap(), compute_hash(&b).unwrap());
    }

    #[test]
    fn hash_ignores_signature_and_timestamps() {
        let mut a = sample();
        let mut b = sample();
        a.created_at = 1;
        b.created_at = 999_999;
        a.updated_at = 5;
        b.updated_at = 6;
        assert_eq!(compute_hash(&a).unwrap(), compute_hash(&b).unwrap());
    }
}

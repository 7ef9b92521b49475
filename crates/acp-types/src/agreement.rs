use serde::{Deserialize, Serialize};

use crate::ids::{AgreementId, EscrowId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgreementStatus {
    Draft,
    Proposed,
    Signed,
    Executed,
    Completed,
    Cancelled,
    Disputed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartySignature {
    pub payload: SignaturePayload,
    /// base58-encoded ed25519 detached signature
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignaturePayload {
    pub agreement_id: AgreementId,
    pub agreement_hash: String,
    pub signer_address: String,
    pub timestamp: i64,
    /// 16 bytes, hex-encoded
    pub nonce: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub address: String,
    pub role: String,
    pub signature: Option<PartySignature>,
    pub signed_at: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermType {
    Payment,
    Deliverable,
    Deadline,
    Condition,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub id: String,
    #[serde(rename = "type")]
    pub term_type: TermType,
    pub description: String,
    pub value: Option<rust_decimal::Decimal>,
    pub due_date: Option<i64>,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agreement {
    pub id: AgreementId,
    pub hash: String,
    pub title: String,
    pub description: String,
    pub parties: Vec<Party>,
    pub terms: Vec<Term>,
    pub total_value: Option<rust_decimal::Decimal>,
    pub currency: Option<String>,
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
    pub escrow_id: Option<EscrowId>,
    pub version: u32,
    pub previous_version_hash: Option<String>,
    pub status: AgreementStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// the exact tuple hashed for the canonical agreement hash (field order
/// fixed by spec §4.4; signatures/timestamps excluded).
#[derive(Serialize)]
pub struct CanonicalAgreement<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub parties: Vec<CanonicalParty<'a>>,
    pub terms: &'a [Term],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_value: Option<rust_decimal::Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escrow_id: Option<&'a str>,
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_version_hash: Option<&'a str>,
}

#[derive(Serialize)]
pub struct CanonicalParty<'a> {
    pub address: &'a str,
    pub role: &'a str,
}

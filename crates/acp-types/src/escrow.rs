use serde::{Deserialize, Serialize};

use crate::ids::EscrowId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscrowStatus {
    Pending,
    Funded,
    Released,
    Refunded,
    Disputed,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionKind {
    Time,
    Signature,
    Oracle,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "type")]
    pub kind: ConditionKind,
    pub value: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Escrow {
    pub id: EscrowId,
    pub chain: String,
    pub buyer: String,
    pub seller: String,
    pub arbiter: Option<String>,
    pub amount: rust_decimal::Decimal,
    pub token_mint: Option<String>,
    pub release_conditions: Vec<Condition>,
    pub refund_conditions: Vec<Condition>,
    pub expires_at: i64,
    pub description: Option<String>,
    pub agreement_hash: Option<String>,
    pub status: EscrowStatus,
    pub escrow_address: String,
    pub tx_signatures: Vec<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: i64,
    pub funded_at: Option<i64>,
    pub completed_at: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionList {
    Release,
    Refund,
}

impl Escrow {
    pub fn conditions(&self, which: ConditionList) -> &[Condition] {
        match which {
            ConditionList::Release => &self.release_conditions,
            ConditionList::Refund => &self.refund_conditions,
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::ids::{AgentId, Address};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Active,
    Inactive,
    Suspended,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReputationAggregate {
    pub total_transactions: u64,
    pub successful_transactions: u64,
    pub average_rating: f64,
    pub total_ratings: u64,
    pub response_time_avg_ms: f64,
}

impl ReputationAggregate {
    pub fn zero() -> Self {
        Self {
            total_transactions: 0,
            successful_transactions: 0,
            average_rating: 0.0,
            total_ratings: 0,
            response_time_avg_ms: 0.0,
        }
    }

    /// `(total - successful) / total`, zero when there have been no transactions
    pub fn dispute_rate(&self) -> f64 {
        if self.total_transactions == 0 {
            0.0
        } else {
            (self.total_transactions - self.successful_transactions) as f64
                / self.total_transactions as f64
        }
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_transactions == 0 {
            0.0
        } else {
            self.successful_transactions as f64 / self.total_transactions as f64
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub address: Address,
    pub name: String,
    pub description: String,
    pub capabilities: Vec<String>,
    pub status: AgentStatus,
    pub reputation: ReputationAggregate,
    pub metadata: Option<serde_json::Value>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    pub address: Address,
    pub name: String,
    pub description: String,
    pub capabilities: Vec<String>,
    pub metadata: Option<serde_json::Value>,
}

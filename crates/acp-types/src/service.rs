use serde::{Deserialize, Serialize};

use crate::ids::{AgentId, RatingId, ServiceId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityCategory {
    Compute,
    Data,
    Analytics,
    Trading,
    Content,
    Research,
    Automation,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capability {
    pub category: CapabilityCategory,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingModel {
    PerRequest,
    PerMinute,
    PerToken,
    Flat,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    pub model: PricingModel,
    /// integer-typed decimal-string amount, minor units
    pub amount: rust_decimal::Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceLevelAgreement {
    pub availability_percent: Option<f64>,
    pub max_response_time_ms: Option<u64>,
    pub max_throughput: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceListing {
    pub id: ServiceId,
    pub agent_id: AgentId,
    pub capability: Capability,
    pub pricing: Pricing,
    pub sla: Option<ServiceLevelAgreement>,
    pub tags: Vec<String>,
    pub enabled: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub id: RatingId,
    pub service_id: ServiceId,
    pub rater_address: String,
    pub rating: u8,
    pub review: Option<String>,
    pub transaction_id: Option<String>,
    pub created_at: i64,
}

impl Rating {
    pub fn validate_score(rating: u8) -> Result<(), String> {
        if (1..=5).contains(&rating) {
            Ok(())
        } else {
            Err(format!("rating must be in 1..=5, got {rating}"))
        }
    }
}

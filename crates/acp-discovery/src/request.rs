use acp_types::agent::Agent;
use acp_types::service::{CapabilityCategory, ServiceListing};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Default)]
pub struct DiscoveryRequest {
    pub need: String,
    pub categories: Vec<CapabilityCategory>,
    pub required_capabilities: Vec<String>,
    pub preferred_capabilities: Vec<String>,
    pub max_price: Option<Decimal>,
    pub min_rating: Option<f64>,
    pub deadline: Option<i64>,
    pub buyer: String,
}

#[derive(Debug, Clone)]
pub struct Subscores {
    pub relevance: f64,
    pub reputation: f64,
    pub price: f64,
    pub availability: f64,
    pub experience: f64,
}

#[derive(Debug, Clone)]
pub struct DiscoveryMatch {
    pub agent: Agent,
    pub service: ServiceListing,
    pub subscores: Subscores,
    pub score: f64,
    pub reasons: Vec<String>,
}

/// `agent.status = active` and the service can serve the request: enabled,
/// category matches if requested, and every required capability appears in
/// the service's capability name or description.
pub fn can_fulfill(service: &ServiceListing, request: &DiscoveryRequest) -> bool {
    if !service.enabled {
        return false;
    }
    if !request.categories.is_empty() && !request.categories.contains(&service.capability.category) {
        return false;
    }
    let haystack = format!(
        "{} {}",
        service.capability.name.to_lowercase(),
        service.capability.description.to_lowercase()
    );
    request
        .required_capabilities
        .iter()
        .all(|cap| haystack.contains(&cap.to_lowercase()))
}

//! the five discovery subscores and their weighted combination
//!
//! each subscore is clamped to `[0, 100]`; weights sum to 1.0.

use acp_types::agent::Agent;
use acp_types::service::ServiceListing;
use rust_decimal::prelude::ToPrimitive;

use crate::request::{DiscoveryRequest, Subscores};

const WEIGHT_RELEVANCE: f64 = 0.35;
const WEIGHT_REPUTATION: f64 = 0.25;
const WEIGHT_PRICE: f64 = 0.20;
const WEIGHT_AVAILABILITY: f64 = 0.10;
const WEIGHT_EXPERIENCE: f64 = 0.10;

fn clamp(v: f64) -> f64 {
    v.clamp(0.0, 100.0)
}

fn word_overlap_bonus(need: &str, haystack: &str) -> f64 {
    let need_words: Vec<&str> = need.split_whitespace().filter(|w| w.len() > 3).collect();
    if need_words.is_empty() {
        return 0.0;
    }
    let haystack = haystack.to_lowercase();
    let matched = need_words.iter().filter(|w| haystack.contains(&w.to_lowercase())).count();
    10.0 * (matched as f64 / need_words.len() as f64)
}

pub fn relevance_score(service: &ServiceListing, request: &DiscoveryRequest) -> f64 {
    let mut score = 0.0;

    if request.categories.contains(&service.capability.category) {
        score += 30.0;
    }

    let haystack = format!(
        "{} {}",
        service.capability.name.to_lowercase(),
        service.capability.description.to_lowercase()
    );

    if !request.required_capabilities.is_empty() {
        let hits = request
            .required_capabilities
            .iter()
            .filter(|c| haystack.contains(&c.to_lowercase()))
            .count();
        score += 40.0 * (hits as f64 / request.required_capabilities.len() as f64);
    }

    if !request.preferred_capabilities.is_empty() {
        let hits = request
            .preferred_capabilities
            .iter()
            .filter(|c| haystack.contains(&c.to_lowercase()))
            .count();
        score += 20.0 * (hits as f64 / request.preferred_capabilities.len() as f64);
    }

    score += word_overlap_bonus(&request.need, &haystack);
    clamp(score)
}

pub fn reputation_score(agent: &Agent) -> f64 {
    let rep = &agent.reputation;
    let score = 50.0 * (rep.average_rating / 5.0)
        + (10.0 * (rep.total_transactions as f64 + 1.0).log10()).min(30.0)
        + 15.0 * rep.success_rate()
        - 20.0 * rep.dispute_rate();
    clamp(score)
}

pub fn price_score(service: &ServiceListing, request: &DiscoveryRequest) -> f64 {
    let Some(budget) = request.max_price else {
        return 50.0;
    };
    if service.pricing.amount > budget {
        return 0.0;
    }
    let budget_f = budget.to_f64().unwrap_or(0.0);
    let price_f = service.pricing.amount.to_f64().unwrap_or(0.0);
    if budget_f <= 0.0 {
        return 50.0;
    }
    clamp(50.0 + 50.0 * (budget_f - price_f) / budget_f)
}

/// the SLA's `max_response_time_ms` earns a two-tier bonus: sub-second is
/// worth more than merely bounded.
pub fn availability_score(service: &ServiceListing) -> f64 {
    if !service.enabled {
        return 0.0;
    }
    let Some(sla) = &service.sla else {
        return 50.0;
    };

    let mut score = 50.0;
    if let Some(avail_pct) = sla.availability_percent {
        score += 2.0 * (avail_pct - 90.0);
    }
    score += match sla.max_response_time_ms {
        Some(ms) if ms <= 1_000 => 20.0,
        Some(_) => 10.0,
        None => 0.0,
    };
    clamp(score)
}

pub fn experience_score(agent: &Agent) -> f64 {
    (25.0 * (agent.reputation.total_transactions as f64 + 1.0).log10()).min(100.0).max(0.0)
}

pub fn compute_subscores(agent: &Agent, service: &ServiceListing, request: &DiscoveryRequest) -> Subscores {
    Subscores {
        relevance: relevance_score(service, request),
        reputation: reputation_score(agent),
        price: price_score(service, request),
        availability: availability_score(service),
        experience: experience_score(agent),
    }
}

pub fn weighted_score(subscores: &Subscores) -> f64 {
    subscores.relevance * WEIGHT_RELEVANCE
        + subscores.reputation * WEIGHT_REPUTATION
        + subscores.price * WEIGHT_PRICE
        + subscores.availability * WEIGHT_AVAILABILITY
        + subscores.experience * WEIGHT_EXPERIENCE
}

/// short, deterministic qualitative tags driven by subscore thresholds.
pub fn reasons(subscores: &Subscores) -> Vec<String> {
    let mut tags = Vec::new();
    if subscores.relevance >= 70.0 {
        tags.push("Highly relevant".to_string());
    }
    if subscores.reputation >= 80.0 {
        tags.push("Excellent reputation".to_string());
    }
    if subscores.price >= 80.0 {
        tags.push("Great value for price".to_string());
    }
    if subscores.experience >= 60.0 {
        tags.push("Experienced provider".to_string());
    }
    if subscores.availability >= 80.0 {
        tags.push("High availability SLA".to_string());
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use acp_types::agent::{Agent, AgentStatus, ReputationAggregate};
    use acp_types::ids::{AgentId, Address};
    use acp_types::service::{Capability, CapabilityCategory, Pricing, PricingModel, ServiceLevelAgreement, ServiceListing};
    use acp_types::ids::ServiceId;

    fn agent(rep: ReputationAggregate) -> Agent {
        Agent {
            id: AgentId::new(),
            address: Address::from("addr"),
            name: "agent".into(),
            description: "desc".into(),
            capabilities: vec![],
            status: AgentStatus::Active,
            reputation: rep,
            metadata: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn service(price: &str) -> ServiceListing {
        ServiceListing {
            id: ServiceId::new(),
            agent_id: Default::default(),
            capability: Capability {
                category: CapabilityCategory::Data,
                name: "btc-price-feed".into(),
                description: "streams bitcoin price data".into(),
            },
            pricing: Pricing {
                model: PricingModel::PerRequest,
                amount: price.parse().unwrap(),
                currency: "USDC".into(),
            },
            sla: Some(ServiceLevelAgreement {
                availability_percent: Some(99.9),
                max_response_time_ms: Some(200),
                max_throughput: None,
            }),
            tags: vec![],
            enabled: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn reputation_score_rewards_high_rating_and_success() {
        let rep = ReputationAggregate {
            total_transactions: 100,
            successful_transactions: 98,
            average_rating: 4.8,
            total_ratings: 50,
            response_time_avg_ms: 100.0,
        };
        let score = reputation_score(&agent(rep));
        assert!(score > 80.0, "expected high reputation score, got {score}");
    }

    #[test]
    fn price_score_is_zero_over_budget() {
        let request = DiscoveryRequest {
            max_price: Some("1".parse().unwrap()),
            ..Default::default()
        };
        assert_eq!(price_score(&service("5"), &request), 0.0);
    }

    #[test]
    fn price_score_is_neutral_without_budget() {
        let request = DiscoveryRequest::default();
        assert_eq!(price_score(&service("5"), &request), 50.0);
    }

    #[test]
    fn availability_score_rewards_tight_sla() {
        let score = availability_score(&service("5"));
        assert!(score > 60.0, "expected availability bonus, got {score}");
    }

    #[test]
    fn relevance_score_rewards_required_capability_match() {
        let request = DiscoveryRequest {
            need: "bitcoin price feed access".into(),
            categories: vec![CapabilityCategory::Data],
            required_capabilities: vec!["bitcoin".into()],
            ..Default::default()
        };
        let score = relevance_score(&service("5"), &request);
        assert!(score > 50.0, "expected relevance bonus, got {score}");
    }
}

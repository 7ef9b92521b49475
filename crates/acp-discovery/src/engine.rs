use acp_types::agent::{Agent, AgentStatus};
use acp_types::service::ServiceListing;

use crate::request::{can_fulfill, DiscoveryMatch, DiscoveryRequest};
use crate::scoring::{compute_subscores, reasons, weighted_score};

/// scores every `(agent, service)` pair that can fulfil the request and
/// returns matches sorted descending by score.
pub fn discover(candidates: &[(Agent, ServiceListing)], request: &DiscoveryRequest) -> Vec<DiscoveryMatch> {
    let mut matches: Vec<DiscoveryMatch> = candidates
        .iter()
        .filter(|(agent, service)| agent.status == AgentStatus::Active && can_fulfill(service, request))
        .filter(|(agent, _)| request.min_rating.map(|min| agent.reputation.average_rating >= min).unwrap_or(true))
        .map(|(agent, service)| {
            let subscores = compute_subscores(agent, service, request);
            let score = weighted_score(&subscores);
            let reasons = reasons(&subscores);
            DiscoveryMatch {
                agent: agent.clone(),
                service: service.clone(),
                subscores,
                score,
                reasons,
            }
        })
        .collect();

    matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    matches
}

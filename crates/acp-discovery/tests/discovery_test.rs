use acp_discovery::{discover, negotiate, DiscoveryRequest, NegotiationOutcome};
use acp_types::agent::{Agent, AgentStatus, ReputationAggregate};
use acp_types::ids::{AgentId, Address, ServiceId};
use acp_types::now_millis;
use acp_types::service::{Capability, CapabilityCategory, Pricing, PricingModel, ServiceListing};

fn agent(name: &str, avg_rating: f64, total_tx: u64) -> Agent {
    Agent {
        id: AgentId::new(),
        address: Address::from(format!("addr-{name}")),
        name: name.into(),
        description: "oracle agent".into(),
        capabilities: vec!["bitcoin-price".into()],
        status: AgentStatus::Active,
        reputation: ReputationAggregate {
            total_transactions: total_tx,
            successful_transactions: total_tx,
            average_rating: avg_rating,
            total_ratings: total_tx,
            response_time_avg_ms: 100.0,
        },
        metadata: None,
        created_at: 0,
        updated_at: 0,
    }
}

fn service(agent_id: AgentId, price: &str) -> ServiceListing {
    ServiceListing {
        id: ServiceId::new(),
        agent_id,
        capability: Capability {
            category: CapabilityCategory::Data,
            name: "btc-price-feed".into(),
            description: "streams BTC/USD price data".into(),
        },
        pricing: Pricing {
            model: PricingModel::PerRequest,
            amount: price.parse().unwrap(),
            currency: "USDC".into(),
        },
        sla: None,
        tags: vec![],
        enabled: true,
        created_at: 0,
        updated_at: 0,
    }
}

#[test]
fn discover_ranks_stronger_reputation_first() {
    let weak = agent("weak", 3.0, 2);
    let strong = agent("strong", 4.9, 500);
    let candidates = vec![
        (weak.clone(), service(weak.id.clone(), "1")),
        (strong.clone(), service(strong.id.clone(), "1")),
    ];

    let request = DiscoveryRequest {
        need: "bitcoin price data".into(),
        categories: vec![CapabilityCategory::Data],
        required_capabilities: vec!["bitcoin".into()],
        buyer: "buyer-1".into(),
        ..Default::default()
    };

    let matches = discover(&candidates, &request);
    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].agent.name, "strong");
}

#[test]
fn discover_excludes_inactive_agents() {
    let mut inactive = agent("inactive", 5.0, 100);
    inactive.status = AgentStatus::Suspended;
    let candidates = vec![(inactive.clone(), service(inactive.id.clone(), "1"))];

    let matches = discover(&candidates, &DiscoveryRequest::default());
    assert!(matches.is_empty());
}

#[test]
fn negotiate_accepts_matching_proposal() {
    let strong = agent("strong", 4.9, 500);
    let svc = service(strong.id.clone(), "10");
    let matched = discover(&[(strong, svc)], &DiscoveryRequest::default()).remove(0);

    let outcome = negotiate(&matched, "buyer-1", Some("10".parse().unwrap()), Some(now_millis() + 48 * 3_600_000), vec![]).unwrap();
    match outcome {
        NegotiationOutcome::Accepted(agreement) => {
            assert_eq!(agreement.parties.len(), 2);
            assert_eq!(agreement.total_value, Some("10".parse().unwrap()));
        }
        NegotiationOutcome::Countered(_) => panic!("expected acceptance"),
    }
}

#[test]
fn negotiate_counters_low_price() {
    let strong = agent("strong", 4.9, 500);
    let svc = service(strong.id.clone(), "10");
    let matched = discover(&[(strong, svc)], &DiscoveryRequest::default()).remove(0);

    let outcome = negotiate(&matched, "buyer-1", Some("1".parse().unwrap()), None, vec![]).unwrap();
    match outcome {
        NegotiationOutcome::Countered(offer) => assert_eq!(offer.price, "10".parse().unwrap()),
        NegotiationOutcome::Accepted(_) => panic!("expected a counter-offer"),
    }
}

#[test]
fn negotiate_counters_short_deadline() {
    let strong = agent("strong", 4.9, 500);
    let svc = service(strong.id.clone(), "10");
    let matched = discover(&[(strong, svc)], &DiscoveryRequest::default()).remove(0);

    let outcome = negotiate(&matched, "buyer-1", None, Some(now_millis() + 3_600_000), vec![]).unwrap();
    assert!(matches!(outcome, NegotiationOutcome::Countered(_)));
}

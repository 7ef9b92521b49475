use acp_persistence::{AgentsRepo, Gateway, RatingsRepo, ServicesRepo};
use acp_registry::{AgentFilters, AgentRegistry, ServiceFilters};
use acp_types::agent::AgentProfile;
use acp_types::ids::Address;
use acp_types::service::{Capability, CapabilityCategory, Pricing, PricingModel, ServiceListing};
use acp_types::ids::ServiceId;

async fn fresh_registry() -> AgentRegistry {
    let gateway = Gateway::connect("sqlite::memory:").await.unwrap();
    AgentRegistry::hydrate(
        AgentsRepo::new(gateway.clone()),
        ServicesRepo::new(gateway.clone()),
        RatingsRepo::new(gateway),
    )
    .await
    .unwrap()
}

fn profile(address: &str, name: &str) -> AgentProfile {
    AgentProfile {
        address: Address::from(address),
        name: name.into(),
        description: "oracle agent".into(),
        capabilities: vec!["bitcoin-price".into()],
        metadata: None,
    }
}

fn listing() -> ServiceListing {
    ServiceListing {
        id: ServiceId::new(),
        agent_id: Default::default(),
        capability: Capability {
            category: CapabilityCategory::Data,
            name: "btc-price-feed".into(),
            description: "streams BTC/USD from three exchanges".into(),
        },
        pricing: Pricing {
            model: PricingModel::PerRequest,
            amount: "0.01".parse().unwrap(),
            currency: "USDC".into(),
        },
        sla: None,
        tags: vec!["crypto".into()],
        enabled: true,
        created_at: 0,
        updated_at: 0,
    }
}

#[tokio::test]
async fn register_rejects_duplicate_address() {
    let registry = fresh_registry().await;
    registry.register(profile("addr-1", "agent-one")).await.unwrap();

    let err = registry.register(profile("addr-1", "agent-two")).await.unwrap_err();
    assert!(matches!(err, acp_types::AcpError::Conflict(_)));
}

#[tokio::test]
async fn list_service_requires_known_agent() {
    let registry = fresh_registry().await;
    let err = registry
        .list_service(&acp_types::ids::AgentId::new(), listing())
        .await
        .unwrap_err();
    assert!(matches!(err, acp_types::AcpError::NotFound(_)));
}

#[tokio::test]
async fn rate_service_rejects_out_of_range_scores() {
    let registry = fresh_registry().await;
    let agent = registry.register(profile("addr-2", "agent-rated")).await.unwrap();
    let service = registry.list_service(&agent.id, listing()).await.unwrap();

    for bad in [0u8, 6u8] {
        let err = registry
            .rate_service(&service.id, "rater-1", bad, None)
            .await
            .unwrap_err();
        assert!(matches!(err, acp_types::AcpError::ValidationError(_)));
    }
}

#[tokio::test]
async fn rate_service_updates_rolling_average_using_prior_total() {
    let registry = fresh_registry().await;
    let agent = registry.register(profile("addr-3", "agent-avg")).await.unwrap();
    let service = registry.list_service(&agent.id, listing()).await.unwrap();

    registry.rate_service(&service.id, "rater-a", 4, None).await.unwrap();
    registry.rate_service(&service.id, "rater-b", 2, None).await.unwrap();

    let updated = registry.get(&agent.id).await.unwrap();
    assert_eq!(updated.reputation.total_ratings, 2);
    assert!((updated.reputation.average_rating - 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn record_transaction_tracks_success_and_dispute_rate() {
    let registry = fresh_registry().await;
    let agent = registry.register(profile("addr-4", "agent-tx")).await.unwrap();

    registry.record_transaction(&agent.id, true, Some(100.0)).await.unwrap();
    let rep = registry.record_transaction(&agent.id, false, Some(300.0)).await.unwrap();

    assert_eq!(rep.total_transactions, 2);
    assert_eq!(rep.successful_transactions, 1);
    assert!((rep.dispute_rate() - 0.5).abs() < 1e-9);
    assert!((rep.response_time_avg_ms - 200.0).abs() < 1e-9);
}

#[tokio::test]
async fn search_services_ranks_higher_reputation_first() {
    let registry = fresh_registry().await;
    let weak = registry.register(profile("addr-5", "agent-weak")).await.unwrap();
    let strong = registry.register(profile("addr-6", "agent-strong")).await.unwrap();

    registry.list_service(&weak.id, listing()).await.unwrap();
    registry.list_service(&strong.id, listing()).await.unwrap();

    for _ in 0..10 {
        registry.record_transaction(&strong.id, true, None).await.unwrap();
    }
    registry.record_transaction(&weak.id, true, None).await.unwrap();
    registry.rate_service(&registry.search_services(ServiceFilters::default()).await.unwrap()[0].id, "r", 5, None).await.ok();

    let results = registry.search_services(ServiceFilters::default()).await.unwrap();
    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn search_agents_filters_by_capability_substring() {
    let registry = fresh_registry().await;
    registry.register(profile("addr-7", "oracle-agent")).await.unwrap();

    let hits = registry
        .search_agents(AgentFilters {
            capability: Some("bitcoin".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);

    let misses = registry
        .search_agents(AgentFilters {
            capability: Some("weather".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(misses.is_empty());
}

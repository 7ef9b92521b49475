use acp_persistence::{AgentsRepo, Gateway};
use acp_types::agent::{Agent, AgentStatus, ReputationAggregate};
use acp_types::ids::{AgentId, Address};

async fn memory_gateway() -> Gateway {
    Gateway::connect("sqlite::memory:").await.unwrap()
}

fn sample_agent() -> Agent {
    Agent {
        id: AgentId::new(),
        address: Address::from("7xK000000000000000000000000000000000000000"),
        name: "test-agent".into(),
        description: "a test agent".into(),
        capabilities: vec!["bitcoin-price".into()],
        status: AgentStatus::Active,
        reputation: ReputationAggregate::zero(),
        metadata: None,
        created_at: 1_000,
        updated_at: 1_000,
    }
}

#[tokio::test]
async fn save_then_get_roundtrips() {
    let gateway = memory_gateway().await;
    let repo = AgentsRepo::new(gateway);
    let agent = sample_agent();

    repo.save(&agent).await.unwrap();
    let fetched = repo.get(&agent.id).await.unwrap().unwrap();

    assert_eq!(fetched.address, agent.address);
    assert_eq!(fetched.capabilities, agent.capabilities);
}

#[tokio::test]
async fn get_by_address_finds_registered_agent() {
    let gateway = memory_gateway().await;
    let repo = AgentsRepo::new(gateway);
    let agent = sample_agent();
    repo.save(&agent).await.unwrap();

    let found = repo.get_by_address(agent.address.as_str()).await.unwrap();
    assert!(found.is_some());
}

#[tokio::test]
async fn save_is_upsert() {
    let gateway = memory_gateway().await;
    let repo = AgentsRepo::new(gateway);
    let mut agent = sample_agent();
    repo.save(&agent).await.unwrap();

    agent.name = "renamed".into();
    repo.save(&agent).await.unwrap();

    let all = repo.list().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "renamed");
}

use acp_persistence::{Gateway, PredictionsRepo};
use acp_predictions::PredictionLedger;
use acp_types::ids::AgentId;

async fn fresh_ledger() -> PredictionLedger {
    let gateway = Gateway::connect("sqlite::memory:").await.unwrap();
    PredictionLedger::new(PredictionsRepo::new(gateway))
}

#[tokio::test]
async fn leaderboard_includes_agents_at_exactly_five_resolved() {
    let ledger = fresh_ledger().await;
    let agent = AgentId::new();

    for i in 0..5 {
        let slug = format!("market-{i}");
        ledger
            .submit(agent.clone(), slug.clone(), 0.8, "leaderboard eligibility boundary test rationale".into())
            .await
            .unwrap();
        ledger.resolve(&slug, 1).await.unwrap();
    }

    let board = ledger.leaderboard().await.unwrap();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].agent_id, agent);
    assert_eq!(board[0].resolved, 5);
}

#[tokio::test]
async fn streak_resets_on_incorrect_prediction() {
    let ledger = fresh_ledger().await;
    let agent = AgentId::new();
    let sequence = [(0.9, 1u8), (0.9, 1), (0.1, 1), (0.9, 1), (0.9, 1)];

    for (i, (probability, outcome)) in sequence.iter().enumerate() {
        let slug = format!("market-{i}");
        ledger
            .submit(agent.clone(), slug.clone(), *probability, "streak tracking sequential rationale text".into())
            .await
            .unwrap();
        ledger.resolve(&slug, *outcome).await.unwrap();
    }

    let stats = ledger.stats(&agent).await.unwrap();
    assert_eq!(stats.streak_current, 2);
    assert_eq!(stats.streak_best, 2);
    assert_eq!(stats.correct, 4);
}

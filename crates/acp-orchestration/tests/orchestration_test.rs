use acp_orchestration::{LoadBalancingPolicy, MessageBus, OrchestrationRegistry, Orchestrator, OrchestrationStatus, TaskQueue};
use acp_types::ids::AgentId;
use acp_types::task::MessageType;
use serde_json::json;

#[tokio::test]
async fn full_pipeline_assigns_and_completes_task() {
    let registry = std::sync::Arc::new(OrchestrationRegistry::new(60_000));
    let queue = TaskQueue::new();
    let agent_id = AgentId::new();
    registry.register(agent_id.clone(), "analyze".into(), vec!["nlp".into()]).await.unwrap();

    let orchestrator = Orchestrator::new(registry.clone(), queue.clone(), LoadBalancingPolicy::Capability);
    let task = queue.submit("analyze".into(), 5, json!({"doc": "hi"}), None, None).await;

    let assignments = orchestrator.schedule_pass().await;
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].1, Some(agent_id.clone()));

    queue.start(&task.id).await.unwrap();
    let completed = queue.complete(&task.id).await.unwrap();
    assert_eq!(completed.status, acp_types::task::TaskStatus::Completed);
}

#[tokio::test]
async fn agent_marked_offline_is_skipped_by_scheduler() {
    let registry = std::sync::Arc::new(OrchestrationRegistry::new(60_000));
    let queue = TaskQueue::new();
    let agent_id = AgentId::new();
    registry.register(agent_id.clone(), "analyze".into(), vec![]).await.unwrap();
    registry.update_status(&agent_id, OrchestrationStatus::Offline).await.unwrap();

    let orchestrator = Orchestrator::new(registry, queue.clone(), LoadBalancingPolicy::RoundRobin);
    queue.submit("analyze".into(), 0, json!({}), None, None).await;

    let assignments = orchestrator.schedule_pass().await;
    assert!(assignments[0].1.is_none());
}

#[tokio::test]
async fn message_bus_supports_request_reply_between_subscribers() {
    let bus = MessageBus::new();
    let mut worker_rx = bus.subscribe("worker-1").await;

    let bus_worker = bus.clone();
    tokio::spawn(async move {
        let request = worker_rx.recv().await.unwrap();
        bus_worker.reply(&request, "worker-1", json!({"status": "ok"})).await.unwrap();
    });

    let reply = bus
        .request("orchestrator", "worker-1", json!({"cmd": "status"}), None)
        .await
        .unwrap();
    assert_eq!(reply.message_type, MessageType::Response);
    assert_eq!(reply.payload, json!({"status": "ok"}));
}

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use metrics::gauge;
use serde::Serialize;

use crate::state::AppState;

pub async fn health() -> &'static str {
    "ok"
}

#[derive(Serialize)]
pub struct NodeInfo {
    pub version: &'static str,
    pub idle_agents: usize,
    pub pending_tasks: usize,
}

pub async fn node_info(State(state): State<Arc<AppState>>) -> Json<NodeInfo> {
    let idle_agents = state.orchestration_registry.list_idle().await.len();
    let pending_tasks = state.task_queue.list().await.iter().filter(|t| t.status == acp_types::task::TaskStatus::Pending).count();

    gauge!("acp_idle_agents").set(idle_agents as f64);
    gauge!("acp_pending_tasks").set(pending_tasks as f64);

    Json(NodeInfo {
        version: env!("CARGO_PKG_VERSION"),
        idle_agents,
        pending_tasks,
    })
}

//! liveness-tracked agent registry for the orchestration plane
//!
//! distinct from `acp-registry`'s marketplace directory: this one tracks
//! heartbeats and scheduling eligibility for agents actively executing
//! tasks, not reputation or service listings.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use acp_types::ids::AgentId;
use acp_types::now_millis;
use acp_types::{AcpError, AcpResult};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestrationStatus {
    Idle,
    Busy,
    Offline,
    Error,
}

#[derive(Debug, Clone)]
pub struct OrchestrationAgent {
    pub id: AgentId,
    pub agent_type: String,
    pub capabilities: Vec<String>,
    pub status: OrchestrationStatus,
    pub last_heartbeat: i64,
}

#[derive(Debug, Clone, Default)]
pub struct FindBestCriteria {
    pub agent_type: Option<String>,
    pub capabilities: Vec<String>,
    pub prefer_idle: bool,
}

pub struct OrchestrationRegistry {
    agents: RwLock<HashMap<AgentId, OrchestrationAgent>>,
    heartbeat_interval_ms: i64,
    stopped: Arc<AtomicBool>,
}

impl OrchestrationRegistry {
    pub fn new(heartbeat_interval_ms: i64) -> Self {
        Self {
            agents: RwLock::new(HashMap::new()),
            heartbeat_interval_ms,
            stopped: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn register(&self, id: AgentId, agent_type: String, capabilities: Vec<String>) -> AcpResult<OrchestrationAgent> {
        let agent = OrchestrationAgent {
            id: id.clone(),
            agent_type,
            capabilities,
            status: OrchestrationStatus::Idle,
            last_heartbeat: now_millis(),
        };
        self.agents.write().await.insert(id, agent.clone());
        Ok(agent)
    }

    pub async fn unregister(&self, id: &AgentId) -> AcpResult<()> {
        self.agents
            .write()
            .await
            .remove(id)
            .ok_or_else(|| AcpError::not_found(format!("agent {id} not registered with orchestrator")))?;
        Ok(())
    }

    pub async fn update_status(&self, id: &AgentId, status: OrchestrationStatus) -> AcpResult<()> {
        let mut agents = self.agents.write().await;
        let agent = agents
            .get_mut(id)
            .ok_or_else(|| AcpError::not_found(format!("agent {id} not registered with orchestrator")))?;
        agent.status = status;
        Ok(())
    }

    pub async fn heartbeat(&self, id: &AgentId) -> AcpResult<()> {
        let mut agents = self.agents.write().await;
        let agent = agents
            .get_mut(id)
            .ok_or_else(|| AcpError::not_found(format!("agent {id} not registered with orchestrator")))?;
        agent.last_heartbeat = now_millis();
        if agent.status == OrchestrationStatus::Offline {
            agent.status = OrchestrationStatus::Idle;
        }
        Ok(())
    }

    pub async fn get(&self, id: &AgentId) -> AcpResult<OrchestrationAgent> {
        self.agents
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AcpError::not_found(format!("agent {id} not registered with orchestrator")))
    }

    pub async fn list(&self) -> Vec<OrchestrationAgent> {
        self.agents.read().await.values().cloned().collect()
    }

    pub async fn list_idle(&self) -> Vec<OrchestrationAgent> {
        self.agents
            .read()
            .await
            .values()
            .filter(|a| a.status == OrchestrationStatus::Idle)
            .cloned()
            .collect()
    }

    /// excludes `offline`/`error`, intersects with the requested type and
    /// capabilities, then returns the candidate with the oldest heartbeat
    /// (round-robin by liveness).
    pub async fn find_best(&self, criteria: &FindBestCriteria) -> Option<OrchestrationAgent> {
        self.agents
            .read()
            .await
            .values()
            .filter(|a| !matches!(a.status, OrchestrationStatus::Offline | OrchestrationStatus::Error))
            .filter(|a| criteria.agent_type.as_ref().map(|t| &a.agent_type == t).unwrap_or(true))
            .filter(|a| criteria.capabilities.iter().all(|c| a.capabilities.contains(c)))
            .filter(|a| !criteria.prefer_idle || a.status == OrchestrationStatus::Idle)
            .min_by_key(|a| a.last_heartbeat)
            .cloned()
    }

    /// every `heartbeat_interval_ms`, marks agents stale for more than
    /// twice that interval as `offline`.
    pub fn spawn_liveness_ticker(self: &Arc<Self>) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let interval = std::time::Duration::from_millis(registry.heartbeat_interval_ms.max(1) as u64);
            loop {
                tokio::time::sleep(interval).await;
                if registry.stopped.load(Ordering::SeqCst) {
                    break;
                }
                registry.sweep_offline().await;
            }
        })
    }

    async fn sweep_offline(&self) {
        let threshold = now_millis() - 2 * self.heartbeat_interval_ms;
        let mut agents = self.agents.write().await;
        for agent in agents.values_mut() {
            if agent.last_heartbeat < threshold && agent.status != OrchestrationStatus::Offline {
                agent.status = OrchestrationStatus::Offline;
                warn!(agent_id = %agent.id, "agent:offline");
            }
        }
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        info!("orchestration registry: liveness ticker stopping");
    }
}

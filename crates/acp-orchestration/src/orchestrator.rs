//! ties the liveness registry and task queue together: assigns pending
//! tasks to eligible agents under a configurable load-balancing policy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use acp_types::ids::TaskId;
use acp_types::task::Task;
use rand::Rng;
use tokio::sync::Notify;
use tracing::{debug, info};

use crate::agent_registry::{FindBestCriteria, OrchestrationAgent, OrchestrationRegistry, OrchestrationStatus};
use crate::task_queue::TaskQueue;

const DEBOUNCE_MS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadBalancingPolicy {
    RoundRobin,
    LeastBusy,
    Random,
    Capability,
}

pub struct Orchestrator {
    registry: Arc<OrchestrationRegistry>,
    queue: Arc<TaskQueue>,
    policy: LoadBalancingPolicy,
    notify: Arc<Notify>,
    round_robin_cursor: AtomicUsize,
}

impl Orchestrator {
    pub fn new(registry: Arc<OrchestrationRegistry>, queue: Arc<TaskQueue>, policy: LoadBalancingPolicy) -> Arc<Self> {
        Arc::new(Self {
            registry,
            queue,
            policy,
            notify: Arc::new(Notify::new()),
            round_robin_cursor: AtomicUsize::new(0),
        })
    }

    /// calling this schedules a debounced scheduling pass: repeated calls
    /// within `DEBOUNCE_MS` collapse into a single pass.
    pub fn kick(&self) {
        self.notify.notify_one();
    }

    pub fn spawn_scheduling_loop(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let orchestrator = self.clone();
        tokio::spawn(async move {
            loop {
                orchestrator.notify.notified().await;
                tokio::time::sleep(std::time::Duration::from_millis(DEBOUNCE_MS)).await;
                orchestrator.schedule_pass().await;
            }
        })
    }

    /// assigns every schedulable pending task to an eligible agent, one
    /// task per pass per agent, honoring the configured policy.
    pub async fn schedule_pass(&self) -> Vec<(TaskId, Option<acp_types::ids::AgentId>)> {
        let mut assignments = Vec::new();
        while let Some(task) = self.queue.next_pending().await {
            match self.pick_agent(&task).await {
                Some(agent) => {
                    if self.queue.assign(&task.id, agent.id.clone()).await.is_ok() {
                        let _ = self.registry.update_status(&agent.id, OrchestrationStatus::Busy).await;
                        debug!(task_id = %task.id, agent_id = %agent.id, "orchestrator:assigned");
                        assignments.push((task.id, Some(agent.id)));
                    }
                }
                None => {
                    assignments.push((task.id, None));
                    break;
                }
            }
        }
        if !assignments.is_empty() {
            info!(count = assignments.len(), "orchestrator:schedule_pass");
        }
        assignments
    }

    async fn pick_agent(&self, task: &Task) -> Option<OrchestrationAgent> {
        let criteria = FindBestCriteria {
            agent_type: Some(task.task_type.clone()),
            capabilities: vec![],
            prefer_idle: matches!(self.policy, LoadBalancingPolicy::LeastBusy | LoadBalancingPolicy::Capability),
        };

        match self.policy {
            LoadBalancingPolicy::RoundRobin => {
                let candidates = self.registry.list_idle().await;
                if candidates.is_empty() {
                    return None;
                }
                let idx = self.round_robin_cursor.fetch_add(1, Ordering::SeqCst) % candidates.len();
                Some(candidates[idx].clone())
            }
            LoadBalancingPolicy::LeastBusy | LoadBalancingPolicy::Capability => self.registry.find_best(&criteria).await,
            LoadBalancingPolicy::Random => {
                let candidates = self.registry.list_idle().await;
                if candidates.is_empty() {
                    return None;
                }
                let idx = rand::thread_rng().gen_range(0..candidates.len());
                Some(candidates[idx].clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acp_types::ids::AgentId;
    use serde_json::Value;

    async fn setup() -> (Arc<OrchestrationRegistry>, Arc<TaskQueue>) {
        (Arc::new(OrchestrationRegistry::new(30_000)), TaskQueue::new())
    }

    #[tokio::test]
    async fn round_robin_cycles_through_idle_agents() {
        let (registry, queue) = setup().await;
        let a = AgentId::new();
        let b = AgentId::new();
        registry.register(a.clone(), "ping".into(), vec![]).await.unwrap();
        registry.register(b.clone(), "ping".into(), vec![]).await.unwrap();

        let orchestrator = Orchestrator::new(registry.clone(), queue.clone(), LoadBalancingPolicy::RoundRobin);
        queue.submit("ping".into(), 0, Value::Null, None, None).await;
        queue.submit("ping".into(), 0, Value::Null, None, None).await;

        let assignments = orchestrator.schedule_pass().await;
        let assigned: Vec<_> = assignments.into_iter().filter_map(|(_, agent)| agent).collect();
        assert_eq!(assigned.len(), 2);
        assert_ne!(assigned[0], assigned[1]);
    }

    #[tokio::test]
    async fn schedule_pass_stops_when_no_agents_available() {
        let (registry, queue) = setup().await;
        let orchestrator = Orchestrator::new(registry, queue.clone(), LoadBalancingPolicy::RoundRobin);
        queue.submit("ping".into(), 0, Value::Null, None, None).await;

        let assignments = orchestrator.schedule_pass().await;
        assert_eq!(assignments.len(), 1);
        assert!(assignments[0].1.is_none());
    }

    #[tokio::test]
    async fn least_busy_only_assigns_idle_agents() {
        let (registry, queue) = setup().await;
        let busy = AgentId::new();
        let idle = AgentId::new();
        registry.register(busy.clone(), "ping".into(), vec![]).await.unwrap();
        registry.register(idle.clone(), "ping".into(), vec![]).await.unwrap();
        registry.update_status(&busy, OrchestrationStatus::Busy).await.unwrap();

        let orchestrator = Orchestrator::new(registry, queue.clone(), LoadBalancingPolicy::LeastBusy);
        queue.submit("ping".into(), 0, Value::Null, None, None).await;

        let assignments = orchestrator.schedule_pass().await;
        assert_eq!(assignments[0].1, Some(idle));
    }
}

//! priority task queue with per-task timeout timers and bounded retries

use std::collections::HashMap;
use std::sync::Arc;

use acp_types::ids::{AgentId, TaskId};
use acp_types::now_millis;
use acp_types::task::{Task, TaskStatus};
use acp_types::{AcpError, AcpResult};
use serde_json::Value;
use tokio::sync::{mpsc, RwLock};
use tracing::{info, warn};

pub const DEFAULT_TIMEOUT_MS: u64 = 5 * 60 * 1000;
pub const DEFAULT_MAX_RETRIES: u32 = 3;

pub struct TaskQueue {
    tasks: RwLock<HashMap<TaskId, Task>>,
    timeout_tx: mpsc::UnboundedSender<TaskId>,
}

impl TaskQueue {
    /// spawns the background loop that watches for expired timers; `on_timeout`
    /// receives the id of every task whose deadline elapsed while still
    /// `Assigned`/`Running`.
    pub fn new() -> Arc<Self> {
        let (timeout_tx, mut timeout_rx) = mpsc::unbounded_channel::<TaskId>();
        let queue = Arc::new(Self {
            tasks: RwLock::new(HashMap::new()),
            timeout_tx,
        });

        let worker = queue.clone();
        tokio::spawn(async move {
            while let Some(task_id) = timeout_rx.recv().await {
                worker.handle_timeout(&task_id).await;
            }
        });

        queue
    }

    pub async fn submit(&self, task_type: String, priority: i64, payload: Value, timeout: Option<u64>, max_retries: Option<u32>) -> Task {
        let now = now_millis();
        let task = Task {
            id: TaskId::new(),
            task_type,
            priority,
            payload,
            status: TaskStatus::Pending,
            assigned_to: None,
            timeout: timeout.unwrap_or(DEFAULT_TIMEOUT_MS),
            retries: 0,
            max_retries: max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            created_at: now,
            updated_at: now,
        };
        self.tasks.write().await.insert(task.id.clone(), task.clone());
        info!(task_id = %task.id, "task:submitted");
        task
    }

    /// highest-priority pending task first, ties broken by earliest submission.
    pub async fn next_pending(&self) -> Option<Task> {
        self.tasks
            .read()
            .await
            .values()
            .filter(|t| t.status == TaskStatus::Pending)
            .min_by(|a, b| b.priority.cmp(&a.priority).then(a.created_at.cmp(&b.created_at)))
            .cloned()
    }

    pub async fn assign(&self, task_id: &TaskId, agent_id: AgentId) -> AcpResult<Task> {
        let task = {
            let mut tasks = self.tasks.write().await;
            let task = self.require_mut(&mut tasks, task_id)?;
            if task.status != TaskStatus::Pending {
                return Err(AcpError::invalid_state(format!("task {task_id} is not pending")));
            }
            task.status = TaskStatus::Assigned;
            task.assigned_to = Some(agent_id);
            task.updated_at = now_millis();
            task.clone()
        };
        Ok(task)
    }

    pub async fn start(&self, task_id: &TaskId) -> AcpResult<Task> {
        let task = {
            let mut tasks = self.tasks.write().await;
            let task = self.require_mut(&mut tasks, task_id)?;
            if task.status != TaskStatus::Assigned {
                return Err(AcpError::invalid_state(format!("task {task_id} is not assigned")));
            }
            task.status = TaskStatus::Running;
            task.updated_at = now_millis();
            task.clone()
        };
        self.arm_timeout(&task);
        Ok(task)
    }

    pub async fn complete(&self, task_id: &TaskId) -> AcpResult<Task> {
        let mut tasks = self.tasks.write().await;
        let task = self.require_mut(&mut tasks, task_id)?;
        task.status = TaskStatus::Completed;
        task.updated_at = now_millis();
        info!(task_id = %task_id, "task:completed");
        Ok(task.clone())
    }

    /// marks the task failed; if retries remain it is reset to `Pending`
    /// (with `assigned_to` cleared) for the scheduler to re-dispatch.
    pub async fn fail(&self, task_id: &TaskId) -> AcpResult<Task> {
        let mut tasks = self.tasks.write().await;
        let task = self.require_mut(&mut tasks, task_id)?;
        task.retries += 1;
        task.updated_at = now_millis();
        if task.retries <= task.max_retries {
            task.status = TaskStatus::Pending;
            task.assigned_to = None;
            warn!(task_id = %task_id, retries = task.retries, "task:retry");
        } else {
            task.status = TaskStatus::Failed;
            warn!(task_id = %task_id, "task:exhausted");
        }
        Ok(task.clone())
    }

    pub async fn cancel(&self, task_id: &TaskId) -> AcpResult<Task> {
        let mut tasks = self.tasks.write().await;
        let task = self.require_mut(&mut tasks, task_id)?;
        if task.status.is_terminal() {
            return Err(AcpError::invalid_state(format!("task {task_id} is already terminal")));
        }
        task.status = TaskStatus::Cancelled;
        task.updated_at = now_millis();
        Ok(task.clone())
    }

    pub async fn get(&self, task_id: &TaskId) -> AcpResult<Task> {
        self.tasks
            .read()
            .await
            .get(task_id)
            .cloned()
            .ok_or_else(|| AcpError::not_found(format!("task {task_id} not found")))
    }

    pub async fn list(&self) -> Vec<Task> {
        self.tasks.read().await.values().cloned().collect()
    }

    fn require_mut<'a>(&self, tasks: &'a mut HashMap<TaskId, Task>, task_id: &TaskId) -> AcpResult<&'a mut Task> {
        tasks
            .get_mut(task_id)
            .ok_or_else(|| AcpError::not_found(format!("task {task_id} not found")))
    }

    fn arm_timeout(&self, task: &Task) {
        let tx = self.timeout_tx.clone();
        let task_id = task.id.clone();
        let timeout = std::time::Duration::from_millis(task.timeout);
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = tx.send(task_id);
        });
    }

    async fn handle_timeout(&self, task_id: &TaskId) {
        let mut tasks = self.tasks.write().await;
        if let Some(task) = tasks.get(task_id) {
            if matches!(task.status, TaskStatus::Assigned | TaskStatus::Running) {
                warn!(task_id = %task_id, "task:timeout");
                drop(tasks);
                let _ = self.fail(task_id).await;
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn assign_then_complete_clears_pending_state() {
        let queue = TaskQueue::new();
        let task = queue.submit("ping".into(), 0, Value::Null, None, None).await;
        queue.assign(&task.id, AgentId::new()).await.unwrap();
        queue.start(&task.id).await.unwrap();
        let done = queue.complete(&task.id).await.unwrap();
        assert_eq!(done.status, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn fail_retries_until_cap_then_terminal() {
        let queue = TaskQueue::new();
        let task = queue.submit("ping".into(), 0, Value::Null, None, Some(1)).await;
        queue.assign(&task.id, AgentId::new()).await.unwrap();
        let once = queue.fail(&task.id).await.unwrap();
        assert_eq!(once.status, TaskStatus::Pending);

        queue.assign(&task.id, AgentId::new()).await.unwrap();
        let twice = queue.fail(&task.id).await.unwrap();
        assert_eq!(twice.status, TaskStatus::Failed);
    }

    #[tokio::test]
    async fn timeout_fails_running_task_automatically() {
        let queue = TaskQueue::new();
        let task = queue.submit("ping".into(), 0, Value::Null, Some(10), Some(0)).await;
        queue.assign(&task.id, AgentId::new()).await.unwrap();
        queue.start(&task.id).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let observed = queue.get(&task.id).await.unwrap();
        assert_eq!(observed.status, TaskStatus::Failed);
    }

    #[tokio::test]
    async fn next_pending_prefers_higher_priority() {
        let queue = TaskQueue::new();
        queue.submit("low".into(), 1, Value::Null, None, None).await;
        let high = queue.submit("high".into(), 10, Value::Null, None, None).await;

        let next = queue.next_pending().await.unwrap();
        assert_eq!(next.id, high.id);
    }
}

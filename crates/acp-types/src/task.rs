use serde::{Deserialize, Serialize};

use crate::ids::{AgentId, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Assigned,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub task_type: String,
    pub priority: i64,
    pub payload: serde_json::Value,
    pub status: TaskStatus,
    pub assigned_to: Option<AgentId>,
    /// millis
    pub timeout: u64,
    pub retries: u32,
    pub max_retries: u32,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Request,
    Response,
    Event,
    Command,
    Heartbeat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: crate::ids::MessageId,
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub payload: serde_json::Value,
    pub timestamp: i64,
    pub reply_to: Option<String>,
    pub correlation_id: Option<String>,
}

//! inter-agent message bus
//!
//! the original callback-registration model translates to Rust as mpsc
//! subscriptions (`subscribe`) plus a oneshot-backed `request`/`reply`
//! pair for synchronous round trips.

use std::collections::HashMap;
use std::sync::Arc;

use acp_types::ids::MessageId;
use acp_types::now_millis;
use acp_types::task::{Message, MessageType};
use acp_types::{AcpError, AcpResult};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::debug;

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

struct PendingReply {
    sender: oneshot::Sender<Message>,
}

pub struct MessageBus {
    subscribers: RwLock<HashMap<String, mpsc::UnboundedSender<Message>>>,
    pending: RwLock<HashMap<String, PendingReply>>,
}

impl MessageBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            subscribers: RwLock::new(HashMap::new()),
            pending: RwLock::new(HashMap::new()),
        })
    }

    /// returns a receiver of every message addressed to `agent`. Re-subscribing
    /// the same id replaces the previous channel.
    pub async fn subscribe(&self, agent: &str) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.write().await.insert(agent.to_string(), tx);
        rx
    }

    pub async fn unsubscribe(&self, agent: &str) {
        self.subscribers.write().await.remove(agent);
    }

    pub async fn send(&self, from: &str, to: &str, message_type: MessageType, payload: Value) -> AcpResult<()> {
        let message = Message {
            id: MessageId::new(),
            from: from.to_string(),
            to: to.to_string(),
            message_type,
            payload,
            timestamp: now_millis(),
            reply_to: None,
            correlation_id: None,
        };
        self.deliver(message).await
    }

    pub async fn broadcast(&self, from: &str, message_type: MessageType, payload: Value) {
        let subscribers = self.subscribers.read().await;
        for (to, tx) in subscribers.iter() {
            if to == from {
                continue;
            }
            let message = Message {
                id: MessageId::new(),
                from: from.to_string(),
                to: to.clone(),
                message_type,
                payload: payload.clone(),
                timestamp: now_millis(),
                reply_to: None,
                correlation_id: None,
            };
            let _ = tx.send(message);
        }
    }

    /// sends a `Request` and awaits a correlated `reply()` call, timing out
    /// after `timeout` (defaults to 30s).
    pub async fn request(&self, from: &str, to: &str, payload: Value, timeout: Option<u64>) -> AcpResult<Message> {
        let correlation_id = MessageId::new().to_string();
        let (tx, rx) = oneshot::channel();
        self.pending.write().await.insert(correlation_id.clone(), PendingReply { sender: tx });

        let message = Message {
            id: MessageId::new(),
            from: from.to_string(),
            to: to.to_string(),
            message_type: MessageType::Request,
            payload,
            timestamp: now_millis(),
            reply_to: None,
            correlation_id: Some(correlation_id.clone()),
        };
        self.deliver(message).await?;

        let wait = std::time::Duration::from_millis(timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS));
        match tokio::time::timeout(wait, rx).await {
            Ok(Ok(reply)) => Ok(reply),
            _ => {
                self.pending.write().await.remove(&correlation_id);
                Err(AcpError::Timeout(format!("request to {to} timed out")))
            }
        }
    }

    /// answers a pending `request()` identified by the original message's
    /// `correlation_id`.
    pub async fn reply(&self, original: &Message, from: &str, payload: Value) -> AcpResult<()> {
        let correlation_id = original
            .correlation_id
            .clone()
            .ok_or_else(|| AcpError::validation("message has no correlation_id to reply to"))?;

        let pending = self.pending.write().await.remove(&correlation_id);
        let reply = Message {
            id: MessageId::new(),
            from: from.to_string(),
            to: original.from.clone(),
            message_type: MessageType::Response,
            payload,
            timestamp: now_millis(),
            reply_to: Some(original.id.to_string()),
            correlation_id: Some(correlation_id),
        };

        match pending {
            Some(p) => {
                let _ = p.sender.send(reply);
                Ok(())
            }
            None => {
                debug!(to = %original.from, "reply: no pending request, delivering as ordinary message");
                self.deliver(reply).await
            }
        }
    }

    async fn deliver(&self, message: Message) -> AcpResult<()> {
        let subscribers = self.subscribers.read().await;
        match subscribers.get(&message.to) {
            Some(tx) => {
                let to = message.to.clone();
                tx.send(message)
                    .map_err(|_| AcpError::not_found(format!("subscriber {} disconnected", to)))?;
                Ok(())
            }
            None => Err(AcpError::not_found(format!("no subscriber for {}", message.to))),
        }
    }
}

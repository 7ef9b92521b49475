//! shared entity types, ids, and error kinds for the agent commerce protocol
//! core. every other crate in the workspace depends on this one and none of
//! it depends back, so it carries no i/o.

pub mod agent;
pub mod agreement;
pub mod error;
pub mod escrow;
pub mod ids;
pub mod keyed_lock;
pub mod prediction;
pub mod service;
pub mod task;

pub use error::{AcpError, AcpResult};

/// millis since the unix epoch, the time unit used throughout the core's
/// timestamps (`expiresAt`, `createdAt`, ...).
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

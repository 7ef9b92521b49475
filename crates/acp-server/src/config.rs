//! CLI flags and environment-derived runtime configuration
//!
//! mirrors `ghettobox-vault::Args`: a `clap` derive struct for the things a
//! human passes on the command line, plus a small `Config` assembled from
//! environment variables for the options spec.md's §6 configuration table
//! names as env-var driven.

use clap::Parser;

use acp_orchestration::LoadBalancingPolicy;

#[derive(Parser)]
#[command(name = "acp-server")]
#[command(about = "Agent Commerce Protocol core, served over HTTP")]
#[command(version)]
pub struct Args {
    /// port to listen on
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// bind address
    #[arg(short, long, default_value = "0.0.0.0")]
    pub bind: String,

    /// sqlite/postgres connection string
    #[arg(long, default_value = "sqlite://acp.db")]
    pub database_url: String,

    /// metrics port (prometheus endpoint, default: port + 1000)
    #[arg(long)]
    pub metrics_port: Option<u16>,
}

pub struct Config {
    pub vault_secret: String,
    pub heartbeat_interval_ms: i64,
    pub task_timeout_ms: u64,
    pub max_retries: u32,
    pub load_balancing: LoadBalancingPolicy,
}

impl Config {
    /// `CLODDS_ESCROW_KEY` (falling back to `CLODDS_CREDENTIAL_KEY`) is
    /// required; everything else has the default spec.md §6 names.
    pub fn from_env() -> Self {
        let vault_secret = std::env::var("CLODDS_ESCROW_KEY")
            .or_else(|_| std::env::var("CLODDS_CREDENTIAL_KEY"))
            .unwrap_or_default();

        let heartbeat_interval_ms = std::env::var("heartbeatInterval")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30_000);
        let task_timeout_ms = std::env::var("taskTimeout")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(acp_orchestration::task_queue::DEFAULT_TIMEOUT_MS);
        let max_retries = std::env::var("maxRetries")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(acp_orchestration::task_queue::DEFAULT_MAX_RETRIES);
        let load_balancing = match std::env::var("loadBalancing").as_deref() {
            Ok("least-busy") => LoadBalancingPolicy::LeastBusy,
            Ok("random") => LoadBalancingPolicy::Random,
            Ok("capability") => LoadBalancingPolicy::Capability,
            _ => LoadBalancingPolicy::RoundRobin,
        };

        Self {
            vault_secret,
            heartbeat_interval_ms,
            task_timeout_ms,
            max_retries,
            load_balancing,
        }
    }
}

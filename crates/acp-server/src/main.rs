//! acp-server — Agent Commerce Protocol core, served over HTTP
//!
//! wires the registry, agreement, escrow, discovery, orchestration, and
//! prediction engines behind a single axum router, following the
//! CLI-args-plus-env-config and prometheus-on-a-side-port shape
//! `ghettobox-vault`'s binary uses.

use std::sync::Arc;

use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

use acp_persistence::Gateway;
use acp_server::config::Args;
use acp_server::{routes, AppState, Config};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("acp_server=info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    let config = Config::from_env();

    let metrics_port = args.metrics_port.unwrap_or(args.port + 1000);
    let metrics_addr: std::net::SocketAddr = format!("{}:{}", args.bind, metrics_port).parse().expect("invalid metrics address");
    PrometheusBuilder::new()
        .with_http_listener(metrics_addr)
        .install()
        .expect("failed to install prometheus metrics exporter");

    let gateway = Gateway::connect(&args.database_url).await.expect("failed to connect to persistence store");
    let state = Arc::new(AppState::build(gateway, &config).await.expect("failed to build application state"));

    info!("acp-server v{}", env!("CARGO_PKG_VERSION"));
    info!("  bind: {}:{}", args.bind, args.port);
    info!("  metrics: {}:{}", args.bind, metrics_port);
    info!("  database: {}", args.database_url);

    let app = routes::build(state);

    let addr = format!("{}:{}", args.bind, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.expect("failed to bind listener");
    info!("listening on {}", addr);

    axum::serve(listener, app).await.expect("server error");
}

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use acp_orchestration::LoadBalancingPolicy;
use acp_persistence::Gateway;
use acp_server::{routes, AppState, Config};

async fn test_app() -> axum::Router {
    let gateway = Gateway::connect("sqlite::memory:").await.unwrap();
    let config = Config {
        vault_secret: "test-secret".into(),
        heartbeat_interval_ms: 30_000,
        task_timeout_ms: 300_000,
        max_retries: 3,
        load_balancing: LoadBalancingPolicy::RoundRobin,
    };
    let state = Arc::new(AppState::build(gateway, &config).await.unwrap());
    routes::build(state)
}

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let app = test_app().await;
    let response = app.oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn register_agent_then_fetch_it() {
    let app = test_app().await;

    let register_body = serde_json::json!({
        "address": "abc123",
        "name": "test agent",
        "description": "an agent used in a test",
        "capabilities": ["trading"],
    });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/agents")
                .header("content-type", "application/json")
                .body(Body::from(register_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let agent: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let id = agent["id"].as_str().unwrap().to_string();
    eprintln!("DEBUG test id={:?} uri={:?}", id, format!("/agents/{id}"));

    let response = app.oneshot(Request::builder().uri(format!("/agents/{id}")).body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn get_unknown_agent_returns_not_found() {
    let app = test_app().await;
    let response = app.oneshot(Request::builder().uri("/agents/does-not-exist").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use lumina_api::auth::CALLER_HEADER;
use lumina_api::build_router;
use lumina_api::state::AppState;
use lumina_llm::{ChatTransport, GatewayConfig, LlmGateway, RetryPolicy};
use lumina_screenplay::application::deps::GenerationDeps;
use lumina_test_support::{FixedClock, InMemoryStore};
use tower::ServiceExt;
use uuid::Uuid;

/// Build application state over an in-memory store, a scripted model, and
/// the fixed test clock.
pub fn build_test_state(store: &Arc<InMemoryStore>, transport: Arc<dyn ChatTransport>) -> AppState {
    let gateway = Arc::new(LlmGateway::new(
        transport,
        GatewayConfig {
            retry: RetryPolicy::immediate(3),
            ..GatewayConfig::default()
        },
    ));
    let deps = GenerationDeps {
        projects: store.clone(),
        scenes: store.clone(),
        ai_logs: store.clone(),
        gateway,
        clock: Arc::new(FixedClock::default()),
    };
    AppState::new(deps, 1)
}

/// Build the full app router. Uses the same route structure as `main.rs`.
pub fn build_test_app(state: AppState) -> Router {
    build_router(state)
}

/// Send a request as `caller` and return the status and JSON body.
pub async fn send(
    app: Router,
    method: &str,
    uri: &str,
    caller: Uuid,
    body: Option<&serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CALLER_HEADER, caller.to_string());
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, json)
}

/// Send a GET request without caller identity.
pub async fn get_anonymous(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body_bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };

    (status, json)
}

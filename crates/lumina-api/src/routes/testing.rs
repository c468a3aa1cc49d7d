//! Fixtures for route tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use lumina_core::model::{Project, ProjectType};
use lumina_llm::{ChatTransport, GatewayConfig, LlmGateway, RetryPolicy};
use lumina_screenplay::application::deps::GenerationDeps;
use lumina_test_support::{FixedClock, InMemoryStore, ScriptedTransport, fixed_now};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use crate::auth::CALLER_HEADER;
use crate::state::AppState;

pub(crate) fn state_with(store: &Arc<InMemoryStore>, transport: Arc<dyn ChatTransport>) -> AppState {
    let gateway = Arc::new(LlmGateway::new(
        transport,
        GatewayConfig {
            retry: RetryPolicy::immediate(2),
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

pub(crate) fn state(store: &Arc<InMemoryStore>) -> AppState {
    state_with(store, Arc::new(ScriptedTransport::new()))
}

pub(crate) fn seed_project(store: &InMemoryStore, project_type: ProjectType) -> Project {
    let mut project = Project::new(
        Uuid::new_v4(),
        "Night Shift".to_string(),
        "A night nurse discovers the hospital is haunted.".to_string(),
        fixed_now(),
    );
    project.project_type = project_type;
    store.seed_project(project.clone());
    project
}

pub(crate) fn request(method: &str, uri: &str, caller: Option<Uuid>, body: Option<&Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(caller) = caller {
        builder = builder.header(CALLER_HEADER, caller.to_string());
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub(crate) async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap()
    };
    (status, json)
}

//! Routes that start and stop screenplay generation.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use lumina_core::error::DomainError;
use lumina_core::model::ProcessingStatus;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use lumina_screenplay::application::command_handlers;
use lumina_screenplay::domain::commands;

use crate::auth::CallerId;
use crate::error::ApiError;
use crate::state::AppState;

/// Optional request body for POST /{project_id}/generate.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    /// Style descriptor overriding the one derived from the answers.
    #[serde(default)]
    pub style: Option<String>,
}

/// Response body for an accepted generation request.
#[derive(Debug, Serialize)]
pub struct GenerationAccepted {
    /// Always `"accepted"`.
    pub status: &'static str,
    /// The project.
    pub project_id: Uuid,
    /// The run that will do the work.
    pub run_id: Uuid,
    /// Outline units that will be planned.
    pub target_count: u32,
    /// Style descriptor the prompts will use.
    pub style: String,
}

/// Response body for POST /{project_id}/stop.
#[derive(Debug, Serialize)]
pub struct StopResponse {
    /// The project.
    pub project_id: Uuid,
    /// Status after the request.
    pub status: ProcessingStatus,
}

/// POST /{project_id}/generate
#[instrument(skip(state, caller, body))]
async fn start_generation(
    State(state): State<AppState>,
    caller: CallerId,
    Path(project_id): Path<Uuid>,
    body: Bytes,
) -> Result<(StatusCode, Json<GenerationAccepted>), ApiError> {
    let request: GenerateRequest = if body.iter().all(u8::is_ascii_whitespace) {
        GenerateRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| DomainError::Validation(format!("invalid request body: {e}")))?
    };

    let command = commands::StartGeneration {
        project_id,
        caller: caller.0,
        style: request.style,
    };

    let started =
        command_handlers::handle_start_generation(&command, &*state.projects, &state.supervisor)
            .await?;
    info!(run_id = %started.run_id, target_count = started.target_count, "generation queued");

    Ok((
        StatusCode::ACCEPTED,
        Json(GenerationAccepted {
            status: "accepted",
            project_id,
            run_id: started.run_id,
            target_count: started.target_count,
            style: started.style,
        }),
    ))
}

/// POST /{project_id}/stop
#[instrument(skip(state, caller))]
async fn stop_generation(
    State(state): State<AppState>,
    caller: CallerId,
    Path(project_id): Path<Uuid>,
) -> Result<Json<StopResponse>, ApiError> {
    let command = commands::StopGeneration {
        project_id,
        caller: caller.0,
    };

    let status =
        command_handlers::handle_stop_generation(&command, &*state.projects, &state.supervisor)
            .await?;

    Ok(Json(StopResponse { project_id, status }))
}

/// Returns the router for generation control.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{project_id}/generate", post(start_generation))
        .route("/{project_id}/stop", post(stop_generation))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use lumina_bible::domain::steps::relevant_steps;
    use lumina_core::bible::StepKey;
    use lumina_core::model::{Project, ProjectType};
    use lumina_test_support::{InMemoryStore, ScriptedTransport};
    use serde_json::json;

    use crate::routes::testing::{request, seed_project, send, state, state_with};

    const OUTLINE: &str = r#"{"scenes":[{"index":1,"outline":"The nurse hears a voice in ward 9."}]}"#;

    fn finished_questionnaire(store: &InMemoryStore) -> Project {
        let mut project = seed_project(store, ProjectType::Movie);
        for step in relevant_steps(ProjectType::Movie) {
            project.answers.insert(step.key, "x");
        }
        project.answers.insert(StepKey::ProjectType, "movie");
        project.answers.insert(StepKey::SceneCount, "2");
        project.answers.insert(StepKey::Genre, "horror");
        store.seed_project(project.clone());
        project
    }

    #[tokio::test]
    async fn test_generate_returns_202_and_runs_in_background() {
        // Arrange
        let store = Arc::new(InMemoryStore::new());
        let project = finished_questionnaire(&store);
        let transport = Arc::new(ScriptedTransport::new().with_fallback(OUTLINE, 10));
        let app_state = state_with(&store, transport);
        let supervisor = app_state.supervisor.clone();
        let app = router().with_state(app_state);

        // Act
        let (status, json) = send(
            app,
            request(
                "POST",
                &format!("/{}/generate", project.id),
                Some(project.owner_id),
                None,
            ),
        )
        .await;
        supervisor.wait_idle(project.id).await;

        // Assert
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(json["status"], "accepted");
        assert_eq!(json["target_count"], 2);
        assert_eq!(json["style"], "horror, x");
        let stored = store.project(project.id).unwrap();
        assert_eq!(stored.status, ProcessingStatus::Completed);
        assert_eq!(store.scenes_of(project.id).len(), 2);
        assert_eq!(stored.total_tokens, 40);
    }

    #[tokio::test]
    async fn test_generate_accepts_explicit_style() {
        // Arrange
        let store = Arc::new(InMemoryStore::new());
        let project = finished_questionnaire(&store);
        let transport = Arc::new(ScriptedTransport::new().with_fallback(OUTLINE, 1));
        let app_state = state_with(&store, transport);
        let supervisor = app_state.supervisor.clone();
        let app = router().with_state(app_state);
        let body = json!({ "style": "found footage" });

        // Act
        let (status, json) = send(
            app,
            request(
                "POST",
                &format!("/{}/generate", project.id),
                Some(project.owner_id),
                Some(&body),
            ),
        )
        .await;
        supervisor.wait_idle(project.id).await;

        // Assert
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(json["style"], "found footage");
    }

    #[tokio::test]
    async fn test_generate_before_questionnaire_is_done_returns_400() {
        // Arrange
        let store = Arc::new(InMemoryStore::new());
        let project = seed_project(&store, ProjectType::Movie);
        let app = router().with_state(state(&store));

        // Act
        let (status, json) = send(
            app,
            request(
                "POST",
                &format!("/{}/generate", project.id),
                Some(project.owner_id),
                None,
            ),
        )
        .await;

        // Assert
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_malformed_body_returns_400() {
        // Arrange
        let store = Arc::new(InMemoryStore::new());
        let project = finished_questionnaire(&store);
        let app = router().with_state(state(&store));
        let request = axum::http::Request::builder()
            .method("POST")
            .uri(format!("/{}/generate", project.id))
            .header(crate::auth::CALLER_HEADER, project.owner_id.to_string())
            .body(axum::body::Body::from("{not json"))
            .unwrap();

        // Act
        let (status, _) = send(app, request).await;

        // Assert
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stop_marks_generating_project_failed() {
        // Arrange
        let store = Arc::new(InMemoryStore::new());
        let mut project = seed_project(&store, ProjectType::Movie);
        project.status = ProcessingStatus::Generating;
        store.seed_project(project.clone());
        let app = router().with_state(state(&store));

        // Act
        let (status, json) = send(
            app,
            request(
                "POST",
                &format!("/{}/stop", project.id),
                Some(project.owner_id),
                None,
            ),
        )
        .await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "FAILED");
        assert_eq!(
            store.project(project.id).unwrap().status,
            ProcessingStatus::Failed
        );
    }
}

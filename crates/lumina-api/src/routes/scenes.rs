//! Routes for a project's scenes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use lumina_core::model::{ProcessingStatus, Scene};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use lumina_screenplay::application::supervisor::Submission;
use lumina_screenplay::application::{command_handlers, query_handlers};
use lumina_screenplay::domain::commands;

use crate::auth::CallerId;
use crate::error::ApiError;
use crate::state::AppState;

/// A scene as returned to its owner.
#[derive(Debug, Serialize)]
pub struct SceneResponse {
    /// Scene identifier.
    pub id: Uuid,
    /// 1-based position.
    pub scene_index: i32,
    /// Outline text.
    pub outline: String,
    /// Generated screenplay text, once written.
    pub content: Option<String>,
    /// Rolling-context marker.
    pub summary: Option<String>,
    /// Processing status.
    pub status: ProcessingStatus,
}

impl From<Scene> for SceneResponse {
    fn from(scene: Scene) -> Self {
        Self {
            id: scene.id,
            scene_index: scene.scene_index,
            outline: scene.outline,
            content: scene.content,
            summary: scene.summary,
            status: scene.status,
        }
    }
}

/// Response body for an accepted regeneration.
#[derive(Debug, Serialize)]
pub struct RegenerateAccepted {
    /// Always `"accepted"`.
    pub status: &'static str,
    /// The project.
    pub project_id: Uuid,
    /// The scene that will be rewritten.
    pub scene_index: i32,
    /// The run that will do it.
    pub run_id: Uuid,
    /// `true` if an already-queued run picked up the work.
    pub coalesced: bool,
}

/// GET /{project_id}/scenes
#[instrument(skip(state, caller))]
async fn list_scenes(
    State(state): State<AppState>,
    caller: CallerId,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<SceneResponse>>, ApiError> {
    let scenes =
        query_handlers::list_scenes(project_id, caller.0, &*state.projects, &*state.scenes).await?;

    Ok(Json(scenes.into_iter().map(Into::into).collect()))
}

/// GET /{project_id}/scenes/{scene_index}
#[instrument(skip(state, caller))]
async fn get_scene(
    State(state): State<AppState>,
    caller: CallerId,
    Path((project_id, scene_index)): Path<(Uuid, i32)>,
) -> Result<Json<SceneResponse>, ApiError> {
    let scene = query_handlers::get_scene(
        project_id,
        caller.0,
        scene_index,
        &*state.projects,
        &*state.scenes,
    )
    .await?;

    Ok(Json(scene.into()))
}

/// POST /{project_id}/scenes/{scene_index}/regenerate
#[instrument(skip(state, caller))]
async fn regenerate_scene(
    State(state): State<AppState>,
    caller: CallerId,
    Path((project_id, scene_index)): Path<(Uuid, i32)>,
) -> Result<(StatusCode, Json<RegenerateAccepted>), ApiError> {
    let command = commands::RegenerateScene {
        project_id,
        caller: caller.0,
        scene_index,
    };

    let submission = command_handlers::handle_regenerate_scene(
        &command,
        &*state.projects,
        &*state.scenes,
        &state.supervisor,
    )
    .await?;
    info!(run_id = %submission.run_id(), "regeneration queued");

    Ok((
        StatusCode::ACCEPTED,
        Json(RegenerateAccepted {
            status: "accepted",
            project_id,
            scene_index,
            run_id: submission.run_id(),
            coalesced: matches!(submission, Submission::Coalesced(_)),
        }),
    ))
}

/// Returns the router for scene resources.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{project_id}/scenes", get(list_scenes))
        .route("/{project_id}/scenes/{scene_index}", get(get_scene))
        .route(
            "/{project_id}/scenes/{scene_index}/regenerate",
            post(regenerate_scene),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use lumina_core::model::ProjectType;
    use lumina_test_support::{InMemoryStore, ScriptedTransport};

    use crate::routes::testing::{request, seed_project, send, state, state_with};

    fn written_scenes(project_id: Uuid, count: i32) -> Vec<Scene> {
        (1..=count)
            .map(|i| {
                let mut scene = Scene::pending(project_id, i, format!("Outline {i}"));
                scene.content = Some(format!("Draft {i}"));
                scene.status = ProcessingStatus::Completed;
                scene
            })
            .collect()
    }

    #[tokio::test]
    async fn test_list_scenes_returns_index_order() {
        // Arrange
        let store = Arc::new(InMemoryStore::new());
        let project = seed_project(&store, ProjectType::Movie);
        store.seed_scenes(written_scenes(project.id, 3));
        let app = router().with_state(state(&store));

        // Act
        let (status, json) = send(
            app,
            request(
                "GET",
                &format!("/{}/scenes", project.id),
                Some(project.owner_id),
                None,
            ),
        )
        .await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        let indices: Vec<i64> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["scene_index"].as_i64().unwrap())
            .collect();
        assert_eq!(indices, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_get_missing_scene_returns_404() {
        // Arrange
        let store = Arc::new(InMemoryStore::new());
        let project = seed_project(&store, ProjectType::Movie);
        let app = router().with_state(state(&store));

        // Act
        let (status, json) = send(
            app,
            request(
                "GET",
                &format!("/{}/scenes/7", project.id),
                Some(project.owner_id),
                None,
            ),
        )
        .await;

        // Assert
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "scene_not_found");
    }

    #[tokio::test]
    async fn test_regenerate_returns_202_and_rewrites_the_scene() {
        // Arrange
        let store = Arc::new(InMemoryStore::new());
        let mut project = seed_project(&store, ProjectType::Movie);
        project.status = ProcessingStatus::Completed;
        store.seed_project(project.clone());
        store.seed_scenes(written_scenes(project.id, 2));
        let transport = Arc::new(ScriptedTransport::new().with_fallback("INT. WARD - NIGHT", 5));
        let app_state = state_with(&store, transport);
        let supervisor = app_state.supervisor.clone();
        let app = router().with_state(app_state);

        // Act
        let (status, json) = send(
            app,
            request(
                "POST",
                &format!("/{}/scenes/2/regenerate", project.id),
                Some(project.owner_id),
                None,
            ),
        )
        .await;
        supervisor.wait_idle(project.id).await;

        // Assert
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(json["status"], "accepted");
        assert_eq!(json["scene_index"], 2);
        assert_eq!(json["coalesced"], false);
        let scenes = store.scenes_of(project.id);
        assert_eq!(scenes[0].content.as_deref(), Some("Draft 1"));
        assert_eq!(scenes[1].content.as_deref(), Some("INT. WARD - NIGHT"));
        assert_eq!(
            store.project(project.id).unwrap().status,
            ProcessingStatus::Completed
        );
    }
}

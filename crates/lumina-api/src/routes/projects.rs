//! Routes for project lifecycle: create, list, read, update, delete.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use lumina_core::bible::StoryBible;
use lumina_core::model::{ProcessingStatus, Project, ProjectType};
use lumina_core::repository::SceneRepository;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use lumina_screenplay::application::{command_handlers, query_handlers};
use lumina_screenplay::domain::commands;

use crate::auth::CallerId;
use crate::error::ApiError;
use crate::routes::scenes::SceneResponse;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    /// Working title; defaults when omitted or blank.
    #[serde(default)]
    pub title: Option<String>,
    /// Premise.
    pub logline: String,
}

/// Request body for PATCH /{project_id}.
#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    /// New title.
    #[serde(default)]
    pub title: Option<String>,
    /// New premise.
    #[serde(default)]
    pub logline: Option<String>,
}

/// A project as returned to its owner.
#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    /// Project identifier.
    pub id: Uuid,
    /// Working title.
    pub title: String,
    /// Premise.
    pub logline: String,
    /// Movie, series, or not yet chosen.
    pub project_type: ProjectType,
    /// Style descriptor used for generation.
    pub genre: Option<String>,
    /// Processing status.
    pub status: ProcessingStatus,
    /// Tokens spent on this project so far.
    pub total_tokens: i64,
    /// Questionnaire answers.
    pub answers: StoryBible,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        Self {
            id: project.id,
            title: project.title,
            logline: project.logline,
            project_type: project.project_type,
            genre: project.genre,
            status: project.status,
            total_tokens: project.total_tokens,
            answers: project.answers,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

/// A project together with its scenes in index order.
#[derive(Debug, Serialize)]
pub struct ProjectDetailResponse {
    /// The project.
    #[serde(flatten)]
    pub project: ProjectResponse,
    /// Its scenes.
    pub scenes: Vec<SceneResponse>,
}

/// POST /
#[instrument(skip(state, caller, request), fields(owner_id = %caller.0))]
async fn create_project(
    State(state): State<AppState>,
    caller: CallerId,
    Json(request): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectResponse>), ApiError> {
    let command = commands::CreateProject {
        owner_id: caller.0,
        title: request.title,
        logline: request.logline,
    };

    let project =
        command_handlers::handle_create_project(&command, state.clock.as_ref(), &*state.projects)
            .await?;

    Ok((StatusCode::CREATED, Json(project.into())))
}

/// GET /
#[instrument(skip(state, caller), fields(owner_id = %caller.0))]
async fn list_projects(
    State(state): State<AppState>,
    caller: CallerId,
) -> Result<Json<Vec<ProjectResponse>>, ApiError> {
    let projects = query_handlers::list_projects(caller.0, &*state.projects).await?;

    Ok(Json(projects.into_iter().map(Into::into).collect()))
}

/// GET /{project_id}
#[instrument(skip(state, caller))]
async fn get_project(
    State(state): State<AppState>,
    caller: CallerId,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ProjectDetailResponse>, ApiError> {
    let project = query_handlers::get_project(project_id, caller.0, &*state.projects).await?;
    let scenes = state.scenes.list(project.id).await?;

    Ok(Json(ProjectDetailResponse {
        project: project.into(),
        scenes: scenes.into_iter().map(Into::into).collect(),
    }))
}

/// PATCH /{project_id}
#[instrument(skip(state, caller, request))]
async fn update_project(
    State(state): State<AppState>,
    caller: CallerId,
    Path(project_id): Path<Uuid>,
    Json(request): Json<UpdateProjectRequest>,
) -> Result<Json<ProjectResponse>, ApiError> {
    let command = commands::UpdateProject {
        project_id,
        caller: caller.0,
        title: request.title,
        logline: request.logline,
    };

    let project =
        command_handlers::handle_update_project(&command, state.clock.as_ref(), &*state.projects)
            .await?;

    Ok(Json(project.into()))
}

/// DELETE /{project_id}
#[instrument(skip(state, caller))]
async fn delete_project(
    State(state): State<AppState>,
    caller: CallerId,
    Path(project_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let command = commands::DeleteProject {
        project_id,
        caller: caller.0,
    };

    command_handlers::handle_delete_project(&command, &*state.projects, &state.supervisor).await?;
    info!("project removed");

    Ok(StatusCode::NO_CONTENT)
}

/// Returns the router for project resources.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route(
            "/{project_id}",
            get(get_project)
                .patch(update_project)
                .delete(delete_project),
        )
}

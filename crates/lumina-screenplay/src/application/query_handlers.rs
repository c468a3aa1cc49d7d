//! Query handlers for the screenplay context.

use lumina_core::error::DomainError;
use lumina_core::model::{AiLogEntry, Project, Scene};
use lumina_core::repository::{AiLogRepository, ProjectRepository, SceneRepository, find_owned};
use uuid::Uuid;

/// Log entries returned when the caller does not ask for a limit.
pub const DEFAULT_LOG_LIMIT: i64 = 50;

/// Largest page of log entries a caller may request.
pub const MAX_LOG_LIMIT: i64 = 200;

/// Returns one of the caller's projects.
///
/// # Errors
///
/// Returns `DomainError::ProjectNotFound` for missing or foreign projects,
/// or `DomainError::Infrastructure` on store failures.
pub async fn get_project(
    project_id: Uuid,
    caller: Uuid,
    projects: &dyn ProjectRepository,
) -> Result<Project, DomainError> {
    find_owned(projects, project_id, caller).await
}

/// Lists the caller's projects, newest first.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` on store failures.
pub async fn list_projects(
    caller: Uuid,
    projects: &dyn ProjectRepository,
) -> Result<Vec<Project>, DomainError> {
    projects.list_by_owner(caller).await
}

/// Lists a project's scenes in index order.
///
/// # Errors
///
/// Returns `DomainError::ProjectNotFound` for missing or foreign projects,
/// or `DomainError::Infrastructure` on store failures.
pub async fn list_scenes(
    project_id: Uuid,
    caller: Uuid,
    projects: &dyn ProjectRepository,
    scenes: &dyn SceneRepository,
) -> Result<Vec<Scene>, DomainError> {
    let project = find_owned(projects, project_id, caller).await?;
    scenes.list(project.id).await
}

/// Returns a single scene by its 1-based index.
///
/// # Errors
///
/// Returns `DomainError::ProjectNotFound` for missing or foreign projects,
/// `DomainError::SceneNotFound` for an unknown index, or
/// `DomainError::Infrastructure` on store failures.
pub async fn get_scene(
    project_id: Uuid,
    caller: Uuid,
    scene_index: i32,
    projects: &dyn ProjectRepository,
    scenes: &dyn SceneRepository,
) -> Result<Scene, DomainError> {
    let project = find_owned(projects, project_id, caller).await?;
    scenes
        .find(project.id, scene_index)
        .await?
        .ok_or(DomainError::SceneNotFound {
            project_id: project.id,
            scene_index,
        })
}

/// Lists a project's AI call log, newest first.
///
/// `limit` defaults to [`DEFAULT_LOG_LIMIT`] and is clamped to
/// `1..=MAX_LOG_LIMIT`.
///
/// # Errors
///
/// Returns `DomainError::ProjectNotFound` for missing or foreign projects,
/// or `DomainError::Infrastructure` on store failures.
pub async fn list_ai_logs(
    project_id: Uuid,
    caller: Uuid,
    limit: Option<i64>,
    projects: &dyn ProjectRepository,
    ai_logs: &dyn AiLogRepository,
) -> Result<Vec<AiLogEntry>, DomainError> {
    let project = find_owned(projects, project_id, caller).await?;
    let limit = limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_LOG_LIMIT);
    ai_logs.list_for_project(project.id, limit).await
}

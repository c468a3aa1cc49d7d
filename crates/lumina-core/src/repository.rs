//! Repository abstractions for projects, scenes, and AI call logs.
//!
//! Implementations must make every write visible to subsequent reads in the
//! same process as soon as the call returns: background loops re-read
//! project status before each unit of work and rely on that.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::bible::StoryBible;
use crate::error::DomainError;
use crate::model::{AiLogEntry, CachedInteraction, ProcessingStatus, Project, ProjectType, Scene};

/// Editable descriptive fields of a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDetails {
    /// Working title.
    pub title: String,
    /// Premise.
    pub logline: String,
}

/// Persistence contract for projects.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Inserts a new project.
    async fn insert(&self, project: &Project) -> Result<(), DomainError>;

    /// Loads a project by ID.
    async fn find(&self, project_id: Uuid) -> Result<Option<Project>, DomainError>;

    /// Lists projects owned by `owner_id`, newest first.
    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Project>, DomainError>;

    /// Updates title and logline and clears the cached interaction in the
    /// same write. Returns `false` if the project does not exist.
    async fn update_details(
        &self,
        project_id: Uuid,
        details: &ProjectDetails,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError>;

    /// Replaces the project type and answers and clears the cached
    /// interaction in the same write. Returns `false` if the project does
    /// not exist.
    async fn save_context(
        &self,
        project_id: Uuid,
        project_type: ProjectType,
        answers: &StoryBible,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError>;

    /// Stores a freshly computed interaction.
    async fn cache_interaction(
        &self,
        project_id: Uuid,
        cached: &CachedInteraction,
    ) -> Result<(), DomainError>;

    /// Sets the style/genre descriptor.
    async fn set_style(&self, project_id: Uuid, style: &str) -> Result<(), DomainError>;

    /// Reads the current status straight from the store.
    async fn status(&self, project_id: Uuid) -> Result<Option<ProcessingStatus>, DomainError>;

    /// Overwrites the project status.
    async fn set_status(
        &self,
        project_id: Uuid,
        status: ProcessingStatus,
    ) -> Result<(), DomainError>;

    /// Atomically adds to the cumulative token counter.
    async fn add_tokens(&self, project_id: Uuid, tokens: i64) -> Result<(), DomainError>;

    /// Deletes a project and its scenes. Returns `false` if it did not exist.
    async fn delete(&self, project_id: Uuid) -> Result<bool, DomainError>;
}

/// Persistence contract for scenes.
#[async_trait]
pub trait SceneRepository: Send + Sync {
    /// Inserts scenes in one transaction.
    async fn insert_many(&self, scenes: &[Scene]) -> Result<(), DomainError>;

    /// Lists a project's scenes ordered by index.
    async fn list(&self, project_id: Uuid) -> Result<Vec<Scene>, DomainError>;

    /// Loads a single scene by its index.
    async fn find(&self, project_id: Uuid, scene_index: i32)
    -> Result<Option<Scene>, DomainError>;

    /// Deletes every scene of a project, returning how many were removed.
    async fn delete_for_project(&self, project_id: Uuid) -> Result<u64, DomainError>;

    /// Overwrites a scene's status.
    async fn set_status(&self, scene_id: Uuid, status: ProcessingStatus)
    -> Result<(), DomainError>;

    /// Stores content and summary and marks the scene completed.
    async fn complete(
        &self,
        scene_id: Uuid,
        content: &str,
        summary: Option<&str>,
    ) -> Result<(), DomainError>;

    /// Clears content and summary and marks the scene pending.
    async fn reset(&self, scene_id: Uuid) -> Result<(), DomainError>;
}

/// Persistence contract for AI call logs.
#[async_trait]
pub trait AiLogRepository: Send + Sync {
    /// Appends an entry.
    async fn append(&self, entry: &AiLogEntry) -> Result<(), DomainError>;

    /// Lists a project's entries, newest first, at most `limit`.
    async fn list_for_project(
        &self,
        project_id: Uuid,
        limit: i64,
    ) -> Result<Vec<AiLogEntry>, DomainError>;
}

/// Loads a project and checks that `caller` owns it.
///
/// # Errors
///
/// Returns `DomainError::ProjectNotFound` if the project does not exist or
/// belongs to someone else, so foreign IDs are indistinguishable from
/// missing ones.
pub async fn find_owned(
    projects: &dyn ProjectRepository,
    project_id: Uuid,
    caller: Uuid,
) -> Result<Project, DomainError> {
    match projects.find(project_id).await? {
        Some(project) if project.owner_id == caller => Ok(project),
        _ => Err(DomainError::ProjectNotFound(project_id)),
    }
}

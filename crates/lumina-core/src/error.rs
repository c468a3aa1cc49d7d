//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The project does not exist or is not owned by the caller.
    #[error("project not found: {0}")]
    ProjectNotFound(Uuid),

    /// The scene does not exist within the project.
    #[error("scene {scene_index} not found in project {project_id}")]
    SceneNotFound {
        /// The project that was searched.
        project_id: Uuid,
        /// The 1-based scene index that was requested.
        scene_index: i32,
    },

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// The LLM upstream failed after exhausting its retry budget.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl DomainError {
    /// Returns `true` for errors that mean "this record is gone".
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ProjectNotFound(_) | Self::SceneNotFound { .. })
    }
}

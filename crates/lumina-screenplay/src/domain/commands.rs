//! Commands for the screenplay context.

use uuid::Uuid;

/// Command to create a project from a logline.
#[derive(Debug, Clone)]
pub struct CreateProject {
    /// The user creating the project.
    pub owner_id: Uuid,
    /// Working title; defaults when absent or blank.
    pub title: Option<String>,
    /// Premise; must not be blank.
    pub logline: String,
}

/// Command to edit a project's title and logline.
#[derive(Debug, Clone)]
pub struct UpdateProject {
    /// The project to edit.
    pub project_id: Uuid,
    /// The user making the request.
    pub caller: Uuid,
    /// New title, if changing.
    pub title: Option<String>,
    /// New logline, if changing.
    pub logline: Option<String>,
}

/// Command to delete a project and everything under it.
#[derive(Debug, Clone)]
pub struct DeleteProject {
    /// The project to delete.
    pub project_id: Uuid,
    /// The user making the request.
    pub caller: Uuid,
}

/// Command to plan the outline and write every scene.
#[derive(Debug, Clone)]
pub struct StartGeneration {
    /// The project to generate.
    pub project_id: Uuid,
    /// The user making the request.
    pub caller: Uuid,
    /// Explicit style descriptor, overriding the one derived from answers.
    pub style: Option<String>,
}

/// Command to cooperatively cancel generation.
#[derive(Debug, Clone)]
pub struct StopGeneration {
    /// The project to stop.
    pub project_id: Uuid,
    /// The user making the request.
    pub caller: Uuid,
}

/// Command to rewrite a single scene.
#[derive(Debug, Clone)]
pub struct RegenerateScene {
    /// The project the scene belongs to.
    pub project_id: Uuid,
    /// The user making the request.
    pub caller: Uuid,
    /// 1-based index of the scene to rewrite.
    pub scene_index: i32,
}

//! Command handlers for the screenplay context.
//!
//! Each handler checks ownership, validates the command against the stored
//! project, persists the change, and hands background work to the
//! supervisor. None of them wait for generation to finish.

use lumina_bible::domain::steps::is_complete;
use lumina_core::bible::StepKey;
use lumina_core::clock::Clock;
use lumina_core::error::DomainError;
use lumina_core::model::{ProcessingStatus, Project};
use lumina_core::repository::{ProjectDetails, ProjectRepository, SceneRepository, find_owned};
use tracing::info;
use uuid::Uuid;

use crate::application::supervisor::{GenerationSupervisor, Submission};
use crate::domain::commands::{
    CreateProject, DeleteProject, RegenerateScene, StartGeneration, StopGeneration, UpdateProject,
};
use crate::domain::target::target_count;

/// Title given to projects created without one.
pub const DEFAULT_TITLE: &str = "Untitled Script";

/// Acknowledgment of an accepted generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationStarted {
    /// Run that will do the work.
    pub run_id: Uuid,
    /// Units the planner will produce.
    pub target_count: u32,
    /// Style descriptor the prompts will use.
    pub style: String,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Handles the `CreateProject` command.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the logline is blank, or
/// `DomainError::Infrastructure` if the insert fails.
pub async fn handle_create_project(
    command: &CreateProject,
    clock: &dyn Clock,
    projects: &dyn ProjectRepository,
) -> Result<Project, DomainError> {
    let Some(logline) = non_blank(Some(&command.logline)) else {
        return Err(DomainError::Validation("logline must not be blank".to_owned()));
    };
    let title = non_blank(command.title.as_deref()).unwrap_or(DEFAULT_TITLE);

    let project = Project::new(
        command.owner_id,
        title.to_owned(),
        logline.to_owned(),
        clock.now(),
    );
    projects.insert(&project).await?;

    info!(project_id = %project.id, owner_id = %project.owner_id, "project created");
    Ok(project)
}

/// Handles the `UpdateProject` command. Fields left out keep their value;
/// the cached interaction is cleared either way.
///
/// # Errors
///
/// Returns `DomainError::ProjectNotFound` for missing or foreign projects,
/// `DomainError::Validation` for a blank logline, or
/// `DomainError::Infrastructure` on store failures.
pub async fn handle_update_project(
    command: &UpdateProject,
    clock: &dyn Clock,
    projects: &dyn ProjectRepository,
) -> Result<Project, DomainError> {
    let mut project = find_owned(projects, command.project_id, command.caller).await?;

    if let Some(logline) = &command.logline {
        let logline = logline.trim();
        if logline.is_empty() {
            return Err(DomainError::Validation("logline must not be blank".to_owned()));
        }
        project.logline = logline.to_owned();
    }
    if let Some(title) = command.title.as_deref() {
        project.title = non_blank(Some(title)).unwrap_or(DEFAULT_TITLE).to_owned();
    }

    let details = ProjectDetails {
        title: project.title.clone(),
        logline: project.logline.clone(),
    };
    let now = clock.now();
    if !projects.update_details(project.id, &details, now).await? {
        return Err(DomainError::ProjectNotFound(project.id));
    }

    project.next_interaction = None;
    project.updated_at = now;
    info!(project_id = %project.id, "project updated");
    Ok(project)
}

/// Handles the `DeleteProject` command: signals any run to stop, drops
/// queued runs, then deletes the project and its scenes.
///
/// # Errors
///
/// Returns `DomainError::ProjectNotFound` for missing or foreign projects,
/// or `DomainError::Infrastructure` on store failures.
pub async fn handle_delete_project(
    command: &DeleteProject,
    projects: &dyn ProjectRepository,
    supervisor: &GenerationSupervisor,
) -> Result<(), DomainError> {
    let project = find_owned(projects, command.project_id, command.caller).await?;

    projects
        .set_status(project.id, ProcessingStatus::Failed)
        .await?;
    supervisor.cancel_queued(project.id);
    if !projects.delete(project.id).await? {
        return Err(DomainError::ProjectNotFound(project.id));
    }

    info!(project_id = %project.id, "project deleted");
    Ok(())
}

/// Picks the style descriptor: the explicit one, else the genre and tone
/// answers, else the descriptor already on the project.
fn derive_style(project: &Project, requested: Option<&str>) -> Option<String> {
    if let Some(style) = non_blank(requested) {
        return Some(style.to_owned());
    }
    let answered: Vec<&str> = [StepKey::Genre, StepKey::Tone]
        .into_iter()
        .filter_map(|key| non_blank(project.answers.get(key)))
        .collect();
    if !answered.is_empty() {
        return Some(answered.join(", "));
    }
    non_blank(project.genre.as_deref()).map(str::to_owned)
}

/// Handles the `StartGeneration` command.
///
/// # Errors
///
/// Returns `DomainError::ProjectNotFound` for missing or foreign projects,
/// `DomainError::Validation` if the questionnaire is unfinished, a run is
/// already generating, or a stopped run is still winding down, or
/// `DomainError::Infrastructure` on store failures.
pub async fn handle_start_generation(
    command: &StartGeneration,
    projects: &dyn ProjectRepository,
    supervisor: &GenerationSupervisor,
) -> Result<GenerationStarted, DomainError> {
    let project = find_owned(projects, command.project_id, command.caller).await?;

    if !is_complete(project.project_type, &project.answers) {
        return Err(DomainError::Validation(
            "finish the story bible before generating".to_owned(),
        ));
    }
    if project.status == ProcessingStatus::Generating {
        return Err(DomainError::Validation(
            "generation is already running; stop it first".to_owned(),
        ));
    }
    if supervisor.is_active(project.id) {
        return Err(DomainError::Validation(
            "the previous run is still stopping; try again shortly".to_owned(),
        ));
    }

    let style = derive_style(&project, command.style.as_deref()).unwrap_or_default();
    if !style.is_empty() {
        projects.set_style(project.id, &style).await?;
    }
    let target = target_count(project.project_type, &project.answers);

    // Set before the run exists; runs never raise it themselves.
    projects
        .set_status(project.id, ProcessingStatus::Generating)
        .await?;
    let submission = supervisor.start_generation(project.id, style.clone(), target);
    info!(project_id = %project.id, run_id = %submission.run_id(), target, "generation accepted");

    Ok(GenerationStarted {
        run_id: submission.run_id(),
        target_count: target,
        style,
    })
}

/// Handles the `StopGeneration` command. Setting the project to failed is
/// the cancellation signal; runs observe it at their next unit boundary.
/// Projects with nothing running are left as they are.
///
/// # Errors
///
/// Returns `DomainError::ProjectNotFound` for missing or foreign projects,
/// or `DomainError::Infrastructure` on store failures.
pub async fn handle_stop_generation(
    command: &StopGeneration,
    projects: &dyn ProjectRepository,
    supervisor: &GenerationSupervisor,
) -> Result<ProcessingStatus, DomainError> {
    let project = find_owned(projects, command.project_id, command.caller).await?;

    if project.status != ProcessingStatus::Generating && !supervisor.is_active(project.id) {
        return Ok(project.status);
    }

    projects
        .set_status(project.id, ProcessingStatus::Failed)
        .await?;
    let dropped = supervisor.cancel_queued(project.id);
    info!(project_id = %project.id, dropped, "generation stop requested");
    Ok(ProcessingStatus::Failed)
}

/// Handles the `RegenerateScene` command: clears the scene, flips the
/// project back to generating, and queues a content run that will only
/// write that scene and any others still pending.
///
/// # Errors
///
/// Returns `DomainError::ProjectNotFound` for missing or foreign projects,
/// `DomainError::SceneNotFound` for an unknown index, or
/// `DomainError::Infrastructure` on store failures.
pub async fn handle_regenerate_scene(
    command: &RegenerateScene,
    projects: &dyn ProjectRepository,
    scenes: &dyn SceneRepository,
    supervisor: &GenerationSupervisor,
) -> Result<Submission, DomainError> {
    let project = find_owned(projects, command.project_id, command.caller).await?;
    let scene = scenes
        .find(project.id, command.scene_index)
        .await?
        .ok_or(DomainError::SceneNotFound {
            project_id: project.id,
            scene_index: command.scene_index,
        })?;

    scenes.reset(scene.id).await?;
    if project.status != ProcessingStatus::Generating {
        projects
            .set_status(project.id, ProcessingStatus::Generating)
            .await?;
    }

    let submission = supervisor.resume_content(project.id);
    info!(
        project_id = %project.id,
        scene_index = command.scene_index,
        run_id = %submission.run_id(),
        "scene regeneration accepted"
    );
    Ok(submission)
}

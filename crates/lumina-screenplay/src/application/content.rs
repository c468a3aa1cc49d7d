//! The content generator loop: writes every pending scene in index order
//! with a rolling context of the scenes before it.

use std::collections::VecDeque;

use lumina_core::error::DomainError;
use lumina_core::model::{AiAction, ProcessingStatus, Project, Scene};
use lumina_core::usage::{Usage, record_usage};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::application::deps::GenerationDeps;
use crate::application::prompts;

const CONTENT_TEMPERATURE: f32 = 0.8;

/// Scene markers carried forward into the next prompt.
pub const ROLLING_WINDOW: usize = 10;

/// Longest outline excerpt kept in a scene marker, in characters.
const MARKER_OUTLINE_CHARS: usize = 160;

/// Content stored when the model produced nothing usable for a scene.
pub const FAILED_CONTENT: &str =
    "[Scene generation failed. Use regenerate to write this scene again.]";

/// Fallback style when the project has no descriptor.
const DEFAULT_STYLE: &str = "grounded, character-driven drama";

/// How a content run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// Every scene was visited.
    Completed {
        /// Scenes written from model output.
        generated: u32,
        /// Scenes that received the failure placeholder.
        failed: u32,
        /// Scenes already completed before this run.
        skipped: u32,
    },
    /// The project was stopped or deleted.
    Cancelled {
        /// Scenes written before the stop was observed.
        processed: u32,
    },
}

/// Short per-scene marker used both as the stored summary and as rolling
/// context, e.g. `Scene 3: The heist goes wrong.`
#[must_use]
pub fn scene_marker(scene: &Scene) -> String {
    let outline = scene.outline.trim();
    let excerpt: String = outline.chars().take(MARKER_OUTLINE_CHARS).collect();
    if excerpt.len() < outline.len() {
        format!("Scene {}: {excerpt}...", scene.scene_index)
    } else {
        format!("Scene {}: {excerpt}", scene.scene_index)
    }
}

/// Bounded window of the most recent scene markers.
#[derive(Debug, Default)]
struct RollingContext {
    markers: VecDeque<String>,
}

impl RollingContext {
    fn push(&mut self, marker: String) {
        if self.markers.len() == ROLLING_WINDOW {
            self.markers.pop_front();
        }
        self.markers.push_back(marker);
    }

    fn render(&self) -> String {
        self.markers
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Writes scene content for a project.
#[derive(Debug, Clone)]
pub struct ContentGenerator {
    deps: GenerationDeps,
}

impl ContentGenerator {
    /// Creates a generator over `deps`.
    #[must_use]
    pub fn new(deps: GenerationDeps) -> Self {
        Self { deps }
    }

    /// Visits every scene in index order, skipping completed ones, and
    /// marks the project completed at the end unless it was stopped.
    ///
    /// The project status is re-read before each scene; a stopped or
    /// deleted project ends the run at that boundary. A scene whose
    /// generation fails gets [`FAILED_CONTENT`] and still completes.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` only for store failures.
    #[instrument(skip(self))]
    pub async fn run(&self, project_id: Uuid) -> Result<LoopOutcome, DomainError> {
        let Some(project) = self.deps.projects.find(project_id).await? else {
            return Ok(LoopOutcome::Cancelled { processed: 0 });
        };
        let style = project
            .genre
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_STYLE)
            .to_owned();

        let scenes = self.deps.scenes.list(project_id).await?;
        info!(scenes = scenes.len(), "content loop started");

        let mut context = RollingContext::default();
        let (mut generated, mut failed, mut skipped) = (0u32, 0u32, 0u32);

        for scene in scenes {
            match self.deps.projects.status(project_id).await? {
                Some(ProcessingStatus::Failed) | None => {
                    let processed = generated + failed;
                    info!(processed, next = scene.scene_index, "content loop cancelled");
                    return Ok(LoopOutcome::Cancelled { processed });
                }
                Some(_) => {}
            }

            if scene.status == ProcessingStatus::Completed {
                context.push(scene.summary.clone().unwrap_or_else(|| scene_marker(&scene)));
                skipped += 1;
                continue;
            }

            self.deps
                .scenes
                .set_status(scene.id, ProcessingStatus::Generating)
                .await?;

            let content = match self.write_scene(&project, &style, &scene, &context.render()).await {
                Some(text) => {
                    generated += 1;
                    text
                }
                None => {
                    failed += 1;
                    FAILED_CONTENT.to_owned()
                }
            };

            let marker = scene_marker(&scene);
            self.deps
                .scenes
                .complete(scene.id, &content, Some(&marker))
                .await?;
            context.push(marker);
            info!(scene_index = scene.scene_index, "scene completed");
        }

        match self.deps.projects.status(project_id).await? {
            Some(ProcessingStatus::Failed) | None => {}
            Some(_) => {
                self.deps
                    .projects
                    .set_status(project_id, ProcessingStatus::Completed)
                    .await?;
            }
        }

        info!(generated, failed, skipped, "content loop finished");
        Ok(LoopOutcome::Completed {
            generated,
            failed,
            skipped,
        })
    }

    async fn write_scene(
        &self,
        project: &Project,
        style: &str,
        scene: &Scene,
        rolling_context: &str,
    ) -> Option<String> {
        let messages = prompts::scene_content(project, style, &scene.outline, rolling_context);
        let prompt = prompts::transcript(&messages);

        let generation = match self
            .deps
            .gateway
            .generate(messages, CONTENT_TEMPERATURE, false)
            .await
        {
            Ok(generation) => generation,
            Err(e) => {
                warn!(scene_index = scene.scene_index, error = %e, "scene generation failed");
                return None;
            }
        };

        record_usage(
            self.deps.projects.as_ref(),
            self.deps.ai_logs.as_ref(),
            self.deps.clock.as_ref(),
            Usage {
                owner_id: project.owner_id,
                project_id: project.id,
                action: AiAction::SceneContent,
                prompt: &prompt,
                response: &generation.text,
                tokens: generation.tokens,
            },
        )
        .await;

        let text = generation.non_empty_text().map(str::to_owned);
        if text.is_none() {
            warn!(scene_index = scene.scene_index, "model returned an empty scene");
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lumina_core::model::ProjectType;
    use lumina_core::repository::SceneRepository;
    use lumina_test_support::{FailingTransport, InMemoryStore, ScriptedTransport, reply};

    use super::*;
    use crate::application::testing::{deps, seed_project};

    fn seed_scenes(store: &InMemoryStore, project_id: Uuid, count: i32) {
        store.seed_scenes((1..=count).map(|i| Scene::pending(project_id, i, format!("Outline {i}"))));
    }

    #[tokio::test]
    async fn test_writes_every_pending_scene_and_completes_project() {
        // Arrange
        let store = Arc::new(InMemoryStore::new());
        let project = seed_project(&store, ProjectType::Movie);
        seed_scenes(&store, project.id, 3);
        let transport = Arc::new(ScriptedTransport::new().with_fallback("INT. VAULT - NIGHT", 20));
        let generator = ContentGenerator::new(deps(&store, transport.clone()));

        // Act
        let outcome = generator.run(project.id).await.unwrap();

        // Assert
        assert_eq!(
            outcome,
            LoopOutcome::Completed {
                generated: 3,
                failed: 0,
                skipped: 0
            }
        );
        let scenes = store.scenes_of(project.id);
        assert!(scenes.iter().all(|s| s.status == ProcessingStatus::Completed));
        assert!(scenes.iter().all(|s| s.content.as_deref() == Some("INT. VAULT - NIGHT")));
        assert_eq!(scenes[1].summary.as_deref(), Some("Scene 2: Outline 2"));
        let stored = store.project(project.id).unwrap();
        assert_eq!(stored.status, ProcessingStatus::Completed);
        assert_eq!(stored.total_tokens, 60);
        assert!(store.ai_logs().iter().all(|e| e.action == AiAction::SceneContent));
    }

    #[tokio::test]
    async fn test_rerun_processes_only_pending_scenes_and_leaves_completed_untouched() {
        // Arrange
        let store = Arc::new(InMemoryStore::new());
        let project = seed_project(&store, ProjectType::Movie);
        seed_scenes(&store, project.id, 5);
        for scene in store.scenes_of(project.id).into_iter().take(3) {
            store
                .complete(scene.id, &format!("Original {}", scene.scene_index), None)
                .await
                .unwrap();
        }
        let transport = Arc::new(ScriptedTransport::new().with_fallback("NEW", 1));
        let generator = ContentGenerator::new(deps(&store, transport.clone()));

        // Act
        let outcome = generator.run(project.id).await.unwrap();

        // Assert
        assert_eq!(
            outcome,
            LoopOutcome::Completed {
                generated: 2,
                failed: 0,
                skipped: 3
            }
        );
        assert_eq!(transport.calls(), 2);
        let contents: Vec<String> = store
            .scenes_of(project.id)
            .into_iter()
            .map(|s| s.content.unwrap())
            .collect();
        assert_eq!(contents, vec!["Original 1", "Original 2", "Original 3", "NEW", "NEW"]);
        let prompt = &transport.requests()[0].messages[0].content;
        assert!(prompt.contains("Scene 3: Outline 3"));
        assert!(prompt.contains("Outline 4"));
    }

    #[tokio::test]
    async fn test_scenes_are_processed_in_index_order_with_rolling_context() {
        // Arrange
        let store = Arc::new(InMemoryStore::new());
        let project = seed_project(&store, ProjectType::Movie);
        seed_scenes(&store, project.id, 3);
        let transport = Arc::new(ScriptedTransport::new().with_fallback("TEXT", 1));
        let generator = ContentGenerator::new(deps(&store, transport.clone()));

        // Act
        generator.run(project.id).await.unwrap();

        // Assert
        let requests = transport.requests();
        assert!(requests[0].messages[0].content.contains("(this is the opening scene)"));
        let third = &requests[2].messages[0].content;
        assert!(third.contains("Scene 1: Outline 1\nScene 2: Outline 2"));
        assert!(third.contains("Current scene goal:\nOutline 3"));
        assert!(!third.contains("TEXT"));
    }

    #[test]
    fn test_rolling_context_keeps_only_the_latest_markers() {
        // Arrange
        let mut context = RollingContext::default();

        // Act
        for i in 1..=12 {
            context.push(format!("Scene {i}"));
        }

        // Assert
        let rendered = context.render();
        assert!(!rendered.contains("Scene 2\n"));
        assert!(rendered.starts_with("Scene 3\n"));
        assert!(rendered.ends_with("Scene 12"));
        assert_eq!(rendered.lines().count(), ROLLING_WINDOW);
    }

    #[tokio::test]
    async fn test_failed_generation_stores_placeholder_and_continues() {
        // Arrange
        let store = Arc::new(InMemoryStore::new());
        let project = seed_project(&store, ProjectType::Movie);
        seed_scenes(&store, project.id, 2);
        let transport = Arc::new(FailingTransport::default());
        let generator = ContentGenerator::new(deps(&store, transport.clone()));

        // Act
        let outcome = generator.run(project.id).await.unwrap();

        // Assert
        assert_eq!(
            outcome,
            LoopOutcome::Completed {
                generated: 0,
                failed: 2,
                skipped: 0
            }
        );
        assert_eq!(transport.calls(), 6);
        let scenes = store.scenes_of(project.id);
        assert!(scenes.iter().all(|s| s.content.as_deref() == Some(FAILED_CONTENT)));
        assert!(scenes.iter().all(|s| s.status == ProcessingStatus::Completed));
        assert!(store.ai_logs().is_empty());
    }

    #[tokio::test]
    async fn test_blank_model_output_counts_as_failure_but_is_still_billed() {
        // Arrange
        let store = Arc::new(InMemoryStore::new());
        let project = seed_project(&store, ProjectType::Movie);
        seed_scenes(&store, project.id, 1);
        let transport = Arc::new(ScriptedTransport::new().with_replies([reply("  \n", 9)]));
        let generator = ContentGenerator::new(deps(&store, transport));

        // Act
        generator.run(project.id).await.unwrap();

        // Assert
        let scene = &store.scenes_of(project.id)[0];
        assert_eq!(scene.content.as_deref(), Some(FAILED_CONTENT));
        assert_eq!(store.project(project.id).unwrap().total_tokens, 9);
    }

    #[tokio::test]
    async fn test_stop_is_observed_at_the_next_scene_boundary() {
        // Arrange
        let store = Arc::new(InMemoryStore::new());
        let project = seed_project(&store, ProjectType::Movie);
        seed_scenes(&store, project.id, 5);
        let hook_store = store.clone();
        let project_id = project.id;
        let transport = Arc::new(ScriptedTransport::new().with_fallback("TEXT", 1).on_call(
            move |call, _| {
                if call == 2 {
                    hook_store.force_status(project_id, ProcessingStatus::Failed);
                }
            },
        ));
        let generator = ContentGenerator::new(deps(&store, transport.clone()));

        // Act
        let outcome = generator.run(project.id).await.unwrap();

        // Assert
        assert_eq!(outcome, LoopOutcome::Cancelled { processed: 2 });
        assert_eq!(transport.calls(), 2);
        let statuses: Vec<ProcessingStatus> = store
            .scenes_of(project.id)
            .iter()
            .map(|s| s.status)
            .collect();
        assert_eq!(
            statuses,
            vec![
                ProcessingStatus::Completed,
                ProcessingStatus::Completed,
                ProcessingStatus::Pending,
                ProcessingStatus::Pending,
                ProcessingStatus::Pending,
            ]
        );
        assert_eq!(
            store.project(project.id).unwrap().status,
            ProcessingStatus::Failed
        );
    }

    #[tokio::test]
    async fn test_deleted_project_cancels_quietly() {
        // Arrange
        let store = Arc::new(InMemoryStore::new());
        let transport = Arc::new(ScriptedTransport::new());
        let generator = ContentGenerator::new(deps(&store, transport.clone()));

        // Act
        let outcome = generator.run(Uuid::new_v4()).await.unwrap();

        // Assert
        assert_eq!(outcome, LoopOutcome::Cancelled { processed: 0 });
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn test_marker_truncates_long_outlines() {
        let scene = Scene::pending(Uuid::new_v4(), 4, "x".repeat(400));

        let marker = scene_marker(&scene);

        assert!(marker.starts_with("Scene 4: xxx"));
        assert!(marker.ends_with("..."));
        assert_eq!(marker.len(), "Scene 4: ".len() + MARKER_OUTLINE_CHARS + 3);
    }
}

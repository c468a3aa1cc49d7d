//! The outline planner: requests outline units in batches and persists
//! each batch as soon as it arrives.

use lumina_core::error::DomainError;
use lumina_core::model::{AiAction, ProcessingStatus, Project, Scene};
use lumina_core::usage::{Usage, record_usage};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::application::deps::GenerationDeps;
use crate::application::prompts;

const OUTLINE_TEMPERATURE: f32 = 0.7;

/// How a planning run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanOutcome {
    /// Every batch was attempted.
    Completed {
        /// Scene rows written, placeholders included.
        scenes: u32,
    },
    /// The project was stopped or deleted; rows already written remain.
    Cancelled {
        /// Scene rows written before the stop was observed.
        persisted: u32,
    },
}

#[derive(Debug, Deserialize)]
struct OutlineBatch {
    #[serde(default)]
    scenes: Vec<OutlineItem>,
}

#[derive(Debug, Deserialize)]
struct OutlineItem {
    #[serde(default)]
    outline: String,
}

/// Outline text stored for a unit the model failed to produce.
#[must_use]
pub fn placeholder_outline(index: u32) -> String {
    format!("[Outline generation failed for unit {index}. Regenerate the outline to retry.]")
}

/// Plans a project's outline.
#[derive(Debug, Clone)]
pub struct OutlinePlanner {
    deps: GenerationDeps,
    batch_size: u32,
}

impl OutlinePlanner {
    /// Creates a planner requesting `batch_size` units per call (at least 1).
    #[must_use]
    pub fn new(deps: GenerationDeps, batch_size: u32) -> Self {
        Self {
            deps,
            batch_size: batch_size.max(1),
        }
    }

    /// Discards existing scenes and plans `target` units in increasing
    /// index order.
    ///
    /// The caller marks the project generating before the run is queued;
    /// the planner never raises the status itself, so a stop recorded at
    /// any point after that is honored. The status is re-read before the
    /// purge and before every batch; a stopped or deleted project ends the
    /// run. A batch that fails or comes back unusable is filled with
    /// placeholder outlines so indices stay contiguous.
    ///
    /// # Errors
    ///
    /// Returns `DomainError` only for store failures. Model failures are
    /// unit-local and never abort the plan.
    #[instrument(skip(self, style), fields(batch_size = self.batch_size))]
    pub async fn plan(
        &self,
        project_id: Uuid,
        style: &str,
        target: u32,
    ) -> Result<PlanOutcome, DomainError> {
        let Some(project) = self.deps.projects.find(project_id).await? else {
            return Ok(PlanOutcome::Cancelled { persisted: 0 });
        };
        if project.status == ProcessingStatus::Failed {
            info!("outline planning cancelled before it started");
            return Ok(PlanOutcome::Cancelled { persisted: 0 });
        }

        let discarded = self.deps.scenes.delete_for_project(project_id).await?;
        info!(discarded, target, "outline planning started");

        let mut previous_arc = String::new();
        let mut persisted = 0u32;
        let mut start = 1u32;

        while start <= target {
            let end = start.saturating_add(self.batch_size - 1).min(target);

            match self.deps.projects.status(project_id).await? {
                Some(ProcessingStatus::Failed) | None => {
                    info!(persisted, next = start, "outline planning cancelled");
                    return Ok(PlanOutcome::Cancelled { persisted });
                }
                Some(_) => {}
            }

            let outlines = self
                .request_batch(&project, style, start, end, target, &previous_arc)
                .await;
            if !outlines.is_empty() {
                let unit = capitalized(prompts::unit_name(&project));
                previous_arc = outlines
                    .iter()
                    .zip(start..)
                    .map(|(outline, index)| format!("{unit} {index}: {outline}"))
                    .collect::<Vec<_>>()
                    .join("\n");
            }

            let batch: Vec<Scene> = (start..=end)
                .zip(
                    outlines
                        .into_iter()
                        .map(Some)
                        .chain(std::iter::repeat(None)),
                )
                .map(|(index, outline)| {
                    let outline = outline.unwrap_or_else(|| placeholder_outline(index));
                    Scene::pending(project_id, index_to_i32(index), outline)
                })
                .collect();

            self.deps.scenes.insert_many(&batch).await?;
            persisted += end - start + 1;
            info!(start, end, persisted, "outline batch persisted");

            if end == target {
                break;
            }
            start = end + 1;
        }

        Ok(PlanOutcome::Completed { scenes: persisted })
    }

    /// Returns at most `end - start + 1` usable outlines, in order. Empty
    /// on any failure.
    async fn request_batch(
        &self,
        project: &Project,
        style: &str,
        start: u32,
        end: u32,
        target: u32,
        previous_arc: &str,
    ) -> Vec<String> {
        let messages = prompts::outline_batch(project, style, start, end, target, previous_arc);
        let prompt = prompts::transcript(&messages);

        let generation = match self
            .deps
            .gateway
            .generate(messages, OUTLINE_TEMPERATURE, true)
            .await
        {
            Ok(generation) => generation,
            Err(e) => {
                warn!(start, end, error = %e, "outline batch failed");
                return Vec::new();
            }
        };

        record_usage(
            self.deps.projects.as_ref(),
            self.deps.ai_logs.as_ref(),
            self.deps.clock.as_ref(),
            Usage {
                owner_id: project.owner_id,
                project_id: project.id,
                action: AiAction::Outline,
                prompt: &prompt,
                response: &generation.text,
                tokens: generation.tokens,
            },
        )
        .await;

        let wanted = usize::try_from(end - start + 1).unwrap_or(usize::MAX);
        let outlines: Vec<String> = generation
            .parse_json::<OutlineBatch>()
            .map(|batch| batch.scenes)
            .unwrap_or_default()
            .into_iter()
            .map(|item| item.outline.trim().to_owned())
            .filter(|outline| !outline.is_empty())
            .take(wanted)
            .collect();

        if outlines.len() < wanted {
            warn!(start, end, returned = outlines.len(), "outline batch incomplete");
        }
        outlines
    }
}

fn capitalized(word: &str) -> String {
    let mut chars = word.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}

fn index_to_i32(index: u32) -> i32 {
    i32::try_from(index).unwrap_or(i32::MAX)
}

//! Persistent records: projects, scenes, and AI call logs.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bible::StoryBible;
use crate::error::DomainError;

/// Processing state shared by projects and scenes.
///
/// For a scene, `Completed` means "processing finished", not "succeeded":
/// a scene whose generation failed still completes, with placeholder content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingStatus {
    /// Waiting for work.
    Pending,
    /// Work is actively being produced.
    Generating,
    /// Processing finished.
    Completed,
    /// Hard stop; background work observes this and halts.
    Failed,
}

impl ProcessingStatus {
    /// Returns the stored representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Generating => "GENERATING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessingStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Older rows were written in lower case.
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "GENERATING" => Ok(Self::Generating),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            _ => Err(DomainError::Infrastructure(format!(
                "unknown processing status: {s}"
            ))),
        }
    }
}

/// Kind of screenplay being developed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    /// Not chosen yet; the initial setup state.
    #[default]
    Pending,
    /// Feature film, planned in scenes.
    Movie,
    /// Television series, planned in episodes.
    Tv,
    /// Short-form drama, planned in episodes.
    Short,
}

impl ProjectType {
    /// Returns the stored representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Movie => "movie",
            Self::Tv => "tv",
            Self::Short => "short",
        }
    }

    /// Returns `true` for episodic formats.
    #[must_use]
    pub fn is_serial(self) -> bool {
        matches!(self, Self::Tv | Self::Short)
    }

    /// Human-readable label used in prompts.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "screenplay",
            Self::Movie => "feature film",
            Self::Tv => "television series",
            Self::Short => "short-form drama",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "movie" | "film" => Ok(Self::Movie),
            "tv" | "series" | "tv_series" => Ok(Self::Tv),
            "short" | "short_drama" => Ok(Self::Short),
            other => Err(DomainError::Validation(format!(
                "unknown project type: {other}"
            ))),
        }
    }
}

/// A memoized interaction payload together with the fingerprint of the
/// context it was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedInteraction {
    /// Digest of the context snapshot the payload reflects.
    pub fingerprint: String,
    /// The serialized interaction.
    pub payload: serde_json::Value,
}

/// A screenplay project owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Project identifier.
    pub id: Uuid,
    /// Owning user account.
    pub owner_id: Uuid,
    /// Working title.
    pub title: String,
    /// One-to-two sentence premise.
    pub logline: String,
    /// Movie, series, or not yet chosen.
    pub project_type: ProjectType,
    /// Free-text style/genre descriptor used for outline and scene prompts.
    pub genre: Option<String>,
    /// Questionnaire answers.
    pub answers: StoryBible,
    /// Cached next interaction, cleared on every context change.
    pub next_interaction: Option<CachedInteraction>,
    /// Tokens consumed by every LLM call made for this project.
    pub total_tokens: i64,
    /// Project-level processing status.
    pub status: ProcessingStatus,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Creates a fresh project in its initial setup state.
    #[must_use]
    pub fn new(owner_id: Uuid, title: String, logline: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            owner_id,
            title,
            logline,
            project_type: ProjectType::Pending,
            genre: None,
            answers: StoryBible::new(),
            next_interaction: None,
            total_tokens: 0,
            status: ProcessingStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One outline unit (scene or episode) of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    /// Scene identifier.
    pub id: Uuid,
    /// Owning project.
    pub project_id: Uuid,
    /// 1-based position, unique within the project.
    pub scene_index: i32,
    /// Outline text the content is generated from.
    pub outline: String,
    /// Generated screenplay text.
    pub content: Option<String>,
    /// Short marker carried forward as rolling context.
    pub summary: Option<String>,
    /// Scene-level processing status.
    pub status: ProcessingStatus,
}

impl Scene {
    /// Creates a pending scene with no content.
    #[must_use]
    pub fn pending(project_id: Uuid, scene_index: i32, outline: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            project_id,
            scene_index,
            outline,
            content: None,
            summary: None,
            status: ProcessingStatus::Pending,
        }
    }
}

/// What an LLM call was made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiAction {
    /// Synthesizing options for a questionnaire step.
    StepOptions,
    /// Planning a batch of outline units.
    Outline,
    /// Writing the content of one scene.
    SceneContent,
}

impl AiAction {
    /// Returns the stored representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StepOptions => "step_options",
            Self::Outline => "outline",
            Self::SceneContent => "scene_content",
        }
    }
}

impl FromStr for AiAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "step_options" => Ok(Self::StepOptions),
            "outline" => Ok(Self::Outline),
            "scene_content" => Ok(Self::SceneContent),
            other => Err(DomainError::Infrastructure(format!(
                "unknown ai action: {other}"
            ))),
        }
    }
}

/// Audit record for one LLM call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiLogEntry {
    /// Entry identifier.
    pub id: Uuid,
    /// User the call was made for.
    pub owner_id: Uuid,
    /// Project the call was made for.
    pub project_id: Uuid,
    /// Purpose of the call.
    pub action: AiAction,
    /// Prompt text sent (user turn).
    pub prompt: String,
    /// Raw response text received.
    pub response: String,
    /// Tokens reported by the upstream.
    pub tokens: i64,
    /// When the call completed.
    pub created_at: DateTime<Utc>,
}

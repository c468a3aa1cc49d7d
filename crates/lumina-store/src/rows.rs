//! Row types and their mapping onto domain records.

use chrono::{DateTime, Utc};
use lumina_core::bible::StoryBible;
use lumina_core::error::DomainError;
use lumina_core::model::{AiLogEntry, CachedInteraction, Project, Scene};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

pub(crate) const PROJECT_COLUMNS: &str = "id, owner_id, title, logline, project_type, genre, \
     answers, next_interaction, total_tokens, status, created_at, updated_at";

pub(crate) const SCENE_COLUMNS: &str =
    "id, project_id, scene_index, outline, content, summary, status";

pub(crate) const AI_LOG_COLUMNS: &str =
    "id, owner_id, project_id, action, prompt, response, tokens, created_at";

pub(crate) fn db_error(e: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(e.to_string())
}

#[derive(Debug, FromRow)]
pub(crate) struct ProjectRow {
    id: Uuid,
    owner_id: Uuid,
    title: String,
    logline: String,
    project_type: String,
    genre: Option<String>,
    answers: Json<StoryBible>,
    next_interaction: Option<Json<CachedInteraction>>,
    total_tokens: i64,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProjectRow> for Project {
    type Error = DomainError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        let project_type = row.project_type.parse().map_err(|_| {
            DomainError::Infrastructure(format!(
                "project {} has unknown type {:?}",
                row.id, row.project_type
            ))
        })?;
        Ok(Self {
            id: row.id,
            owner_id: row.owner_id,
            title: row.title,
            logline: row.logline,
            project_type,
            genre: row.genre,
            answers: row.answers.0,
            next_interaction: row.next_interaction.map(|json| json.0),
            total_tokens: row.total_tokens,
            status: row.status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct SceneRow {
    id: Uuid,
    project_id: Uuid,
    scene_index: i32,
    outline: String,
    content: Option<String>,
    summary: Option<String>,
    status: String,
}

impl TryFrom<SceneRow> for Scene {
    type Error = DomainError;

    fn try_from(row: SceneRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            project_id: row.project_id,
            scene_index: row.scene_index,
            outline: row.outline,
            content: row.content,
            summary: row.summary,
            status: row.status.parse()?,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct AiLogRow {
    id: Uuid,
    owner_id: Uuid,
    project_id: Uuid,
    action: String,
    prompt: String,
    response: String,
    tokens: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<AiLogRow> for AiLogEntry {
    type Error = DomainError;

    fn try_from(row: AiLogRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            owner_id: row.owner_id,
            project_id: row.project_id,
            action: row.action.parse()?,
            prompt: row.prompt,
            response: row.response,
            tokens: row.tokens,
            created_at: row.created_at,
        })
    }
}

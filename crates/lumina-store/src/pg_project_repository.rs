//! `PostgreSQL` implementation of the `ProjectRepository` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lumina_core::bible::StoryBible;
use lumina_core::error::DomainError;
use lumina_core::model::{CachedInteraction, ProcessingStatus, Project, ProjectType};
use lumina_core::repository::{ProjectDetails, ProjectRepository};
use sqlx::PgPool;
use sqlx::types::Json;
use tracing::debug;
use uuid::Uuid;

use crate::rows::{PROJECT_COLUMNS, ProjectRow, db_error};

/// PostgreSQL-backed project repository.
#[derive(Debug, Clone)]
pub struct PgProjectRepository {
    pool: PgPool,
}

impl PgProjectRepository {
    /// Creates a new `PgProjectRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectRepository for PgProjectRepository {
    async fn insert(&self, project: &Project) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO projects (id, owner_id, title, logline, project_type, genre, answers, \
             next_interaction, total_tokens, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(project.id)
        .bind(project.owner_id)
        .bind(&project.title)
        .bind(&project.logline)
        .bind(project.project_type.as_str())
        .bind(project.genre.as_deref())
        .bind(Json(&project.answers))
        .bind(project.next_interaction.as_ref().map(Json))
        .bind(project.total_tokens)
        .bind(project.status.as_str())
        .bind(project.created_at)
        .bind(project.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn find(&self, project_id: Uuid) -> Result<Option<Project>, DomainError> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1");
        sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .map(Project::try_from)
            .transpose()
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Project>, DomainError> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE owner_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, ProjectRow>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(Project::try_from)
            .collect()
    }

    async fn update_details(
        &self,
        project_id: Uuid,
        details: &ProjectDetails,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            "UPDATE projects SET title = $2, logline = $3, next_interaction = NULL, \
             updated_at = $4 WHERE id = $1",
        )
        .bind(project_id)
        .bind(&details.title)
        .bind(&details.logline)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn save_context(
        &self,
        project_id: Uuid,
        project_type: ProjectType,
        answers: &StoryBible,
        now: DateTime<Utc>,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            "UPDATE projects SET project_type = $2, answers = $3, next_interaction = NULL, \
             updated_at = $4 WHERE id = $1",
        )
        .bind(project_id)
        .bind(project_type.as_str())
        .bind(Json(answers))
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn cache_interaction(
        &self,
        project_id: Uuid,
        cached: &CachedInteraction,
    ) -> Result<(), DomainError> {
        sqlx::query("UPDATE projects SET next_interaction = $2 WHERE id = $1")
            .bind(project_id)
            .bind(Json(cached))
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn set_style(&self, project_id: Uuid, style: &str) -> Result<(), DomainError> {
        sqlx::query("UPDATE projects SET genre = $2 WHERE id = $1")
            .bind(project_id)
            .bind(style)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn status(&self, project_id: Uuid) -> Result<Option<ProcessingStatus>, DomainError> {
        let status: Option<String> = sqlx::query_scalar("SELECT status FROM projects WHERE id = $1")
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        status.map(|s| s.parse()).transpose()
    }

    async fn set_status(
        &self,
        project_id: Uuid,
        status: ProcessingStatus,
    ) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE projects SET status = $2 WHERE id = $1")
            .bind(project_id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        debug!(%project_id, %status, rows = result.rows_affected(), "project status set");
        Ok(())
    }

    async fn add_tokens(&self, project_id: Uuid, tokens: i64) -> Result<(), DomainError> {
        sqlx::query("UPDATE projects SET total_tokens = total_tokens + $2 WHERE id = $1")
            .bind(project_id)
            .bind(tokens)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    async fn delete(&self, project_id: Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(project_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }
}

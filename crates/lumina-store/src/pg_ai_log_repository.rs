//! `PostgreSQL` implementation of the `AiLogRepository` trait.

use async_trait::async_trait;
use lumina_core::error::DomainError;
use lumina_core::model::AiLogEntry;
use lumina_core::repository::AiLogRepository;
use sqlx::PgPool;
use uuid::Uuid;

use crate::rows::{AI_LOG_COLUMNS, AiLogRow, db_error};

/// PostgreSQL-backed AI call log.
#[derive(Debug, Clone)]
pub struct PgAiLogRepository {
    pool: PgPool,
}

impl PgAiLogRepository {
    /// Creates a new `PgAiLogRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AiLogRepository for PgAiLogRepository {
    async fn append(&self, entry: &AiLogEntry) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO ai_logs (id, owner_id, project_id, action, prompt, response, tokens, \
             created_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(entry.id)
        .bind(entry.owner_id)
        .bind(entry.project_id)
        .bind(entry.action.as_str())
        .bind(&entry.prompt)
        .bind(&entry.response)
        .bind(entry.tokens)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn list_for_project(
        &self,
        project_id: Uuid,
        limit: i64,
    ) -> Result<Vec<AiLogEntry>, DomainError> {
        let sql = format!(
            "SELECT {AI_LOG_COLUMNS} FROM ai_logs WHERE project_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2"
        );
        sqlx::query_as::<_, AiLogRow>(&sql)
            .bind(project_id)
            .bind(limit.max(0))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(AiLogEntry::try_from)
            .collect()
    }
}

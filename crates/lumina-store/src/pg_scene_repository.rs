//! `PostgreSQL` implementation of the `SceneRepository` trait.

use async_trait::async_trait;
use lumina_core::error::DomainError;
use lumina_core::model::{ProcessingStatus, Scene};
use lumina_core::repository::SceneRepository;
use sqlx::PgPool;
use sqlx::postgres::PgQueryResult;
use uuid::Uuid;

use crate::rows::{SCENE_COLUMNS, SceneRow, db_error};

/// PostgreSQL-backed scene repository.
#[derive(Debug, Clone)]
pub struct PgSceneRepository {
    pool: PgPool,
}

impl PgSceneRepository {
    /// Creates a new `PgSceneRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps an update that touched no row to an infrastructure error.
fn expect_row(
    scene_id: Uuid,
    result: Result<PgQueryResult, sqlx::Error>,
) -> Result<(), DomainError> {
    if result.map_err(db_error)?.rows_affected() == 0 {
        return Err(DomainError::Infrastructure(format!("no scene row {scene_id}")));
    }
    Ok(())
}

#[async_trait]
impl SceneRepository for PgSceneRepository {
    async fn insert_many(&self, scenes: &[Scene]) -> Result<(), DomainError> {
        if scenes.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(db_error)?;
        for scene in scenes {
            sqlx::query(
                "INSERT INTO scenes (id, project_id, scene_index, outline, content, summary, status) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(scene.id)
            .bind(scene.project_id)
            .bind(scene.scene_index)
            .bind(&scene.outline)
            .bind(scene.content.as_deref())
            .bind(scene.summary.as_deref())
            .bind(scene.status.as_str())
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }
        tx.commit().await.map_err(db_error)?;
        Ok(())
    }

    async fn list(&self, project_id: Uuid) -> Result<Vec<Scene>, DomainError> {
        let sql = format!(
            "SELECT {SCENE_COLUMNS} FROM scenes WHERE project_id = $1 ORDER BY scene_index ASC"
        );
        sqlx::query_as::<_, SceneRow>(&sql)
            .bind(project_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?
            .into_iter()
            .map(Scene::try_from)
            .collect()
    }

    async fn find(
        &self,
        project_id: Uuid,
        scene_index: i32,
    ) -> Result<Option<Scene>, DomainError> {
        let sql = format!(
            "SELECT {SCENE_COLUMNS} FROM scenes WHERE project_id = $1 AND scene_index = $2"
        );
        sqlx::query_as::<_, SceneRow>(&sql)
            .bind(project_id)
            .bind(scene_index)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .map(Scene::try_from)
            .transpose()
    }

    async fn delete_for_project(&self, project_id: Uuid) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM scenes WHERE project_id = $1")
            .bind(project_id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected())
    }

    async fn set_status(
        &self,
        scene_id: Uuid,
        status: ProcessingStatus,
    ) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE scenes SET status = $2 WHERE id = $1")
            .bind(scene_id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await;
        expect_row(scene_id, result)
    }

    async fn complete(
        &self,
        scene_id: Uuid,
        content: &str,
        summary: Option<&str>,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE scenes SET content = $2, summary = $3, status = $4 WHERE id = $1",
        )
        .bind(scene_id)
        .bind(content)
        .bind(summary)
        .bind(ProcessingStatus::Completed.as_str())
        .execute(&self.pool)
        .await;
        expect_row(scene_id, result)
    }

    async fn reset(&self, scene_id: Uuid) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE scenes SET content = NULL, summary = NULL, status = $2 WHERE id = $1",
        )
        .bind(scene_id)
        .bind(ProcessingStatus::Pending.as_str())
        .execute(&self.pool)
        .await;
        expect_row(scene_id, result)
    }
}

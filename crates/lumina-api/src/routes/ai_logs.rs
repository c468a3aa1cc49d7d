//! Route for a project's AI call log.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use lumina_core::model::{AiAction, AiLogEntry};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use lumina_screenplay::application::query_handlers;

use crate::auth::CallerId;
use crate::error::ApiError;
use crate::state::AppState;

/// Query string for GET /{project_id}/ai-logs.
#[derive(Debug, Deserialize)]
pub struct LogQuery {
    /// Maximum entries to return.
    pub limit: Option<i64>,
}

/// One logged LLM call.
#[derive(Debug, Serialize)]
pub struct AiLogResponse {
    /// Entry identifier.
    pub id: Uuid,
    /// What the call was for.
    pub action: AiAction,
    /// Prompt transcript.
    pub prompt: String,
    /// Raw model output.
    pub response: String,
    /// Tokens billed.
    pub tokens: i64,
    /// When the call completed.
    pub created_at: DateTime<Utc>,
}

impl From<AiLogEntry> for AiLogResponse {
    fn from(entry: AiLogEntry) -> Self {
        Self {
            id: entry.id,
            action: entry.action,
            prompt: entry.prompt,
            response: entry.response,
            tokens: entry.tokens,
            created_at: entry.created_at,
        }
    }
}

/// GET /{project_id}/ai-logs
#[instrument(skip(state, caller))]
async fn list_ai_logs(
    State(state): State<AppState>,
    caller: CallerId,
    Path(project_id): Path<Uuid>,
    Query(query): Query<LogQuery>,
) -> Result<Json<Vec<AiLogResponse>>, ApiError> {
    let entries = query_handlers::list_ai_logs(
        project_id,
        caller.0,
        query.limit,
        &*state.projects,
        &*state.ai_logs,
    )
    .await?;

    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

/// Returns the router for the AI call log.
pub fn router() -> Router<AppState> {
    Router::new().route("/{project_id}/ai-logs", get(list_ai_logs))
}

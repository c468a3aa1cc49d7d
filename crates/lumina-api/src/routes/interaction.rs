//! Routes for the story-bible questionnaire.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use lumina_bible::domain::interaction::Interaction;
use lumina_core::error::DomainError;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;
use uuid::Uuid;

use crate::auth::CallerId;
use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /{project_id}/interaction.
#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    /// Step key being answered.
    pub field: String,
    /// The answer; numbers and booleans are accepted and stored as text.
    pub value: Value,
}

fn answer_text(value: &Value) -> Result<String, ApiError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(ApiError(DomainError::Validation(
            "value must be a string, number, or boolean".to_string(),
        ))),
    }
}

/// GET /{project_id}/interaction
#[instrument(skip(state, caller))]
async fn next_interaction(
    State(state): State<AppState>,
    caller: CallerId,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Interaction>, ApiError> {
    let interaction = state.resolver().resolve(project_id, caller.0).await?;

    Ok(Json(interaction))
}

/// POST /{project_id}/interaction
#[instrument(skip(state, caller, request), fields(field = %request.field))]
async fn submit_answer(
    State(state): State<AppState>,
    caller: CallerId,
    Path(project_id): Path<Uuid>,
    Json(request): Json<SubmitAnswerRequest>,
) -> Result<Json<Interaction>, ApiError> {
    let value = answer_text(&request.value)?;
    let interaction = state
        .resolver()
        .submit_answer(project_id, caller.0, &request.field, &value)
        .await?;

    Ok(Json(interaction))
}

/// POST /{project_id}/interaction/reset
#[instrument(skip(state, caller))]
async fn reset_interaction(
    State(state): State<AppState>,
    caller: CallerId,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Interaction>, ApiError> {
    let interaction = state.resolver().reset(project_id, caller.0).await?;

    Ok(Json(interaction))
}

/// Returns the router for the questionnaire.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/{project_id}/interaction",
            get(next_interaction).post(submit_answer),
        )
        .route("/{project_id}/interaction/reset", post(reset_interaction))
}

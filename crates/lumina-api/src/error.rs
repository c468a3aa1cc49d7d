//! Lumina API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lumina_core::error::DomainError;
use lumina_llm::LlmError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The schema could not be brought up to date.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),

    /// The tracing pipeline could not be installed.
    #[error("telemetry error: {0}")]
    Telemetry(String),

    /// The LLM client could not be built.
    #[error("llm client error: {0}")]
    Llm(#[from] LlmError),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer wrapper around `DomainError` that implements `IntoResponse`.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self.0 {
            DomainError::ProjectNotFound(_) => (StatusCode::NOT_FOUND, "project_not_found"),
            DomainError::SceneNotFound { .. } => (StatusCode::NOT_FOUND, "scene_not_found"),
            DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            DomainError::Upstream(_) => (StatusCode::SERVICE_UNAVAILABLE, "upstream_error"),
            DomainError::Infrastructure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "infrastructure_error")
            }
        };

        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }

        let body = ErrorBody {
            error: error_code,
            message: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use uuid::Uuid;

    fn status_of(err: DomainError) -> StatusCode {
        let response = ApiError(err).into_response();
        response.status()
    }

    #[test]
    fn test_project_not_found_maps_to_404() {
        assert_eq!(
            status_of(DomainError::ProjectNotFound(Uuid::new_v4())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_scene_not_found_maps_to_404() {
        assert_eq!(
            status_of(DomainError::SceneNotFound {
                project_id: Uuid::new_v4(),
                scene_index: 4,
            }),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_validation_maps_to_400() {
        assert_eq!(
            status_of(DomainError::Validation("bad input".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_upstream_maps_to_503() {
        assert_eq!(
            status_of(DomainError::Upstream("model unavailable".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_infrastructure_maps_to_500() {
        assert_eq!(
            status_of(DomainError::Infrastructure("db down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

//! Caller identity.
//!
//! Credentials are verified upstream; by the time a request reaches this
//! service the authenticated user ID travels in a header.

use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use crate::error::ErrorBody;

/// Header carrying the authenticated user ID.
pub const CALLER_HEADER: &str = "x-user-id";

/// The authenticated user making the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerId(pub Uuid);

/// Rejection for requests without a usable caller identity.
#[derive(Debug)]
pub struct MissingCaller;

impl IntoResponse for MissingCaller {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: "unauthorized",
            message: format!("missing or invalid {CALLER_HEADER} header"),
        };
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

impl<S> FromRequestParts<S> for CallerId
where
    S: Send + Sync,
{
    type Rejection = MissingCaller;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(CALLER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .map(Self)
            .ok_or(MissingCaller)
    }
}

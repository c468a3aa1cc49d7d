//! Lumina API — HTTP surface of the screenplay service.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the full application router.
pub fn build_router(state: AppState) -> Router {
    let projects = routes::projects::router()
        .merge(routes::interaction::router())
        .merge(routes::generation::router())
        .merge(routes::scenes::router())
        .merge(routes::ai_logs::router());

    // TODO: Replace CorsLayer::permissive() with the front end's origin once it has a fixed host.
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1/projects", projects)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

//! Lumina API server entry point.

use std::sync::Arc;
use std::time::Duration;

use lumina_api::config::AppConfig;
use lumina_api::error::AppError;
use lumina_api::state::AppState;
use lumina_api::{build_router, telemetry};
use lumina_core::clock::SystemClock;
use lumina_llm::{LlmGateway, OpenAiTransport, mask_key};
use lumina_screenplay::application::deps::GenerationDeps;
use lumina_store::{PgAiLogRepository, PgProjectRepository, PgSceneRepository, run_migrations};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

/// How long in-flight generation runs get to finish after the server stops.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // A missing .env file is fine; the environment may already be set.
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    let telemetry = telemetry::init(config.otlp_endpoint.as_deref())?;

    info!("Starting Lumina API server");
    match config.llm.api_key.as_deref() {
        Some(key) => info!(api_key = %mask_key(key), model = %config.llm.model, "LLM configured"),
        None => warn!("LLM_API_KEY is not set; model calls will fail"),
    }

    // Create database connection pool.
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    run_migrations(&pool).await?;

    // Build application state.
    let transport = Arc::new(OpenAiTransport::new(&config.llm.openai_config())?);
    let deps = GenerationDeps {
        projects: Arc::new(PgProjectRepository::new(pool.clone())),
        scenes: Arc::new(PgSceneRepository::new(pool.clone())),
        ai_logs: Arc::new(PgAiLogRepository::new(pool)),
        gateway: Arc::new(LlmGateway::new(transport, config.llm.gateway_config())),
        clock: Arc::new(SystemClock),
    };
    let app_state = AppState::new(deps, config.outline_batch_size);
    let supervisor = Arc::clone(&app_state.supervisor);

    let app = build_router(app_state);

    // Start server.
    let addr = config.socket_addr()?;
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped; draining generation runs");
    if tokio::time::timeout(DRAIN_TIMEOUT, supervisor.shutdown())
        .await
        .is_err()
    {
        warn!(timeout_secs = DRAIN_TIMEOUT.as_secs(), "generation runs still active at exit");
    }

    telemetry.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("shutdown signal received");
}

//! Tracing subscriber and optional OTLP span export.

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::error::AppError;

const SERVICE_NAME: &str = "lumina-api";

/// Handle to the installed tracing pipeline.
pub struct Telemetry {
    provider: Option<SdkTracerProvider>,
}

impl Telemetry {
    /// Flushes and stops span export, if it was enabled.
    pub fn shutdown(self) {
        if let Some(provider) = self.provider
            && let Err(e) = provider.shutdown()
        {
            tracing::warn!(error = %e, "failed to flush spans on shutdown");
        }
    }
}

/// Installs the global subscriber: JSON logs filtered by `RUST_LOG`
/// (default `info`), plus OTLP span export when `otlp_endpoint` is set.
///
/// # Errors
///
/// Returns `AppError::Telemetry` if the exporter cannot be built or a
/// global subscriber is already installed.
pub fn init(otlp_endpoint: Option<&str>) -> Result<Telemetry, AppError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let provider = otlp_endpoint
        .map(|endpoint| {
            let exporter = SpanExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint)
                .build()
                .map_err(|e| AppError::Telemetry(e.to_string()))?;
            Ok::<_, AppError>(
                SdkTracerProvider::builder()
                    .with_batch_exporter(exporter)
                    .with_resource(Resource::builder().with_service_name(SERVICE_NAME).build())
                    .build(),
            )
        })
        .transpose()?;

    let otel_layer = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer(SERVICE_NAME)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json())
        .with(otel_layer)
        .try_init()
        .map_err(|e| AppError::Telemetry(e.to_string()))?;

    if let Some(endpoint) = otlp_endpoint {
        tracing::info!(endpoint, "exporting spans over OTLP");
    }

    Ok(Telemetry { provider })
}

//! Server configuration read from the environment.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use lumina_llm::{GatewayConfig, OpenAiConfig, RetryPolicy, mask_key};

use crate::error::AppError;

/// LLM connection and pacing settings.
#[derive(Clone)]
pub struct LlmSettings {
    /// Bearer key; calls fail upstream without one.
    pub api_key: Option<String>,
    /// OpenAI-compatible base URL.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Admission gate size.
    pub max_concurrency: usize,
    /// Attempts per call, including the first.
    pub max_attempts: u32,
    /// Wait before the first retry.
    pub backoff_initial: Duration,
    /// Cap on any single wait.
    pub backoff_max: Duration,
    /// Per-attempt transport timeout.
    pub timeout: Duration,
}

impl LlmSettings {
    /// Transport settings for [`lumina_llm::OpenAiTransport`].
    #[must_use]
    pub fn openai_config(&self) -> OpenAiConfig {
        OpenAiConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            timeout: self.timeout,
        }
    }

    /// Gateway settings for [`lumina_llm::LlmGateway`].
    #[must_use]
    pub fn gateway_config(&self) -> GatewayConfig {
        GatewayConfig {
            model: self.model.clone(),
            max_concurrency: self.max_concurrency,
            retry: RetryPolicy {
                max_attempts: self.max_attempts,
                initial_backoff: self.backoff_initial,
                max_backoff: self.backoff_max,
            },
        }
    }
}

impl fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmSettings")
            .field("api_key", &self.api_key.as_deref().map(mask_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("max_concurrency", &self.max_concurrency)
            .field("max_attempts", &self.max_attempts)
            .field("backoff_initial", &self.backoff_initial)
            .field("backoff_max", &self.backoff_max)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Everything the server needs to start.
#[derive(Clone)]
pub struct AppConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Connection pool size.
    pub database_max_connections: u32,
    /// LLM settings.
    pub llm: LlmSettings,
    /// Units requested per planner call.
    pub outline_batch_size: u32,
    /// OTLP collector endpoint; tracing export is off when unset.
    pub otlp_endpoint: Option<String>,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_max_connections", &self.database_max_connections)
            .field("llm", &self.llm)
            .field("outline_batch_size", &self.outline_batch_size)
            .field("otlp_endpoint", &self.otlp_endpoint)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `DATABASE_URL` is missing or any value
    /// fails to parse.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which returns the raw value
    /// of a variable if it is set.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if `DATABASE_URL` is missing or any value
    /// fails to parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or_else(|| {
            AppError::Config("DATABASE_URL environment variable must be set".to_string())
        })?;

        let llm = LlmSettings {
            api_key: get("LLM_API_KEY"),
            base_url: get("LLM_BASE_URL")
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model: get("LLM_MODEL_ID").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            max_concurrency: parse_or(&get, "LLM_MAX_CONCURRENCY", 20)?,
            max_attempts: parse_or(&get, "LLM_MAX_ATTEMPTS", 3)?,
            backoff_initial: Duration::from_secs(parse_or(&get, "LLM_BACKOFF_INITIAL_SECS", 2)?),
            backoff_max: Duration::from_secs(parse_or(&get, "LLM_BACKOFF_MAX_SECS", 10)?),
            timeout: Duration::from_secs(parse_or(&get, "LLM_TIMEOUT_SECS", 120)?),
        };
        if llm.max_attempts == 0 {
            return Err(AppError::Config(
                "LLM_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }

        let outline_batch_size = parse_or(&get, "OUTLINE_BATCH_SIZE", 1)?;
        if outline_batch_size == 0 {
            return Err(AppError::Config(
                "OUTLINE_BATCH_SIZE must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            database_url,
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&get, "PORT", 3000)?,
            database_max_connections: parse_or(&get, "DATABASE_MAX_CONNECTIONS", 10)?,
            llm,
            outline_batch_size,
            otlp_endpoint: get("OTEL_EXPORTER_OTLP_ENDPOINT"),
        })
    }

    /// The address to bind.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if host and port do not form a socket
    /// address.
    pub fn socket_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}

fn parse_or<T>(
    get: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match get(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{name} is invalid: {e}"))),
        None => Ok(default),
    }
}

//! The admission-gated, retrying gateway.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::sync::Semaphore;
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, info, instrument, warn};

use crate::error::LlmError;
use crate::extraction::extract_json;
use crate::transport::{ChatMessage, ChatRequest, ChatTransport};

/// Exponential backoff between attempts of one call.
///
/// The wait before retry `n` (0-based) is `min(max_backoff, initial_backoff
/// * 2^n)`. There is no budget shared across calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first.
    pub max_attempts: u32,
    /// Wait before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound on any single wait.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// A policy with no waiting between attempts.
    #[must_use]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Waits between consecutive attempts; one fewer than `max_attempts`.
    #[must_use]
    pub fn delays(&self) -> Vec<Duration> {
        let retries = self.max_attempts.saturating_sub(1);
        (0..retries)
            .map(|n| {
                let factor = 2u32.saturating_pow(n);
                self.initial_backoff
                    .saturating_mul(factor)
                    .min(self.max_backoff)
            })
            .collect()
    }
}

/// Gateway construction settings.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Model identifier sent with every request.
    pub model: String,
    /// Maximum concurrent in-flight calls across the process.
    pub max_concurrency: usize,
    /// Retry behaviour per call.
    pub retry: RetryPolicy,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_owned(),
            max_concurrency: 20,
            retry: RetryPolicy::default(),
        }
    }
}

/// Text returned by a gateway call, with the tokens it cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    /// Model output; for JSON calls, the extracted object when one was found.
    pub text: String,
    /// Tokens reported by the upstream.
    pub tokens: u64,
}

impl Generation {
    /// Parses the text as JSON.
    ///
    /// A parse failure is not an error for callers: they treat `None` as
    /// empty data and fall back. The tokens were still spent.
    #[must_use]
    pub fn parse_json<T: DeserializeOwned>(&self) -> Option<T> {
        match serde_json::from_str(&self.text) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, text_len = self.text.len(), "llm output is not the expected json");
                None
            }
        }
    }

    /// Returns the trimmed text, or `None` if the model returned nothing.
    #[must_use]
    pub fn non_empty_text(&self) -> Option<&str> {
        let trimmed = self.text.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

/// The single caller of the chat-completion upstream.
///
/// Construct one per process and share it: the admission gate it owns is
/// the global backpressure valve for every project.
pub struct LlmGateway {
    transport: Arc<dyn ChatTransport>,
    gate: Semaphore,
    max_concurrency: usize,
    retry: RetryPolicy,
    model: String,
}

impl std::fmt::Debug for LlmGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmGateway")
            .field("model", &self.model)
            .field("max_concurrency", &self.max_concurrency)
            .field("available", &self.gate.available_permits())
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl LlmGateway {
    /// Creates a gateway over `transport`.
    #[must_use]
    pub fn new(transport: Arc<dyn ChatTransport>, config: GatewayConfig) -> Self {
        let max_concurrency = config.max_concurrency.max(1);
        Self {
            transport,
            gate: Semaphore::new(max_concurrency),
            max_concurrency,
            retry: config.retry,
            model: config.model,
        }
    }

    /// Model identifier in use.
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Admission slots currently free.
    #[must_use]
    pub fn available_permits(&self) -> usize {
        self.gate.available_permits()
    }

    /// Runs one chat completion through the admission gate with retries.
    ///
    /// Each attempt holds a gate permit only while the transport call is in
    /// flight; backoff waits do not occupy a slot. With `expect_json`, the
    /// first balanced JSON object is extracted from the output; if none is
    /// found the raw text is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Exhausted` wrapping the last failure once every
    /// attempt has failed.
    #[instrument(skip(self, messages), fields(model = %self.model, messages = messages.len()))]
    pub async fn generate(
        &self,
        messages: Vec<ChatMessage>,
        temperature: f32,
        expect_json: bool,
    ) -> Result<Generation, LlmError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            temperature,
        };
        let attempts = AtomicU32::new(0);
        let max_attempts = self.retry.max_attempts.max(1);

        let outcome = Retry::spawn(self.retry.delays(), || {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            let request = &request;
            async move {
                let Ok(_permit) = self.gate.acquire().await else {
                    return Err(RetryError::Permanent(LlmError::Configuration(
                        "admission gate closed".to_owned(),
                    )));
                };
                debug!(attempt, max_attempts, "llm call admitted");
                match self.transport.complete(request).await {
                    Ok(completion) => Ok(completion),
                    Err(err) => {
                        warn!(attempt, max_attempts, error = %err, "llm call failed");
                        Err(RetryError::Transient {
                            err,
                            retry_after: None,
                        })
                    }
                }
            }
        })
        .await;

        let completion = outcome.map_err(|last| LlmError::Exhausted {
            attempts: attempts.load(Ordering::SeqCst),
            last: Box::new(last),
        })?;

        info!(tokens = completion.total_tokens, "llm call completed");

        let text = if expect_json {
            extract_json(&completion.content).unwrap_or(completion.content)
        } else {
            completion.content
        };

        Ok(Generation {
            text,
            tokens: completion.total_tokens,
        })
    }
}

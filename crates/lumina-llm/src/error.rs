//! LLM gateway errors.

use thiserror::Error;

/// Errors raised while calling the chat-completion upstream.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Network-level failure, including timeouts.
    #[error("http error: {0}")]
    Http(String),

    /// The upstream answered with a non-success status.
    #[error("upstream returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The upstream answered but the body was not a usable completion.
    #[error("response error: {0}")]
    Response(String),

    /// The client could not be built or used as configured.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Every attempt failed; carries the last failure.
    #[error("llm call failed after {attempts} attempt(s): {last}")]
    Exhausted {
        /// Attempts made.
        attempts: u32,
        /// The error from the final attempt.
        #[source]
        last: Box<LlmError>,
    },
}

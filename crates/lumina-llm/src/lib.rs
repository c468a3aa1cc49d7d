//! Lumina LLM — gateway to an OpenAI-compatible chat-completion API.
//!
//! The [`LlmGateway`] is the only component that talks to the model. It caps
//! in-flight calls with a process-wide admission gate, retries transport
//! failures with exponential backoff, reports token usage per call, and can
//! pull a JSON object out of free-form model output.

mod error;
mod extraction;
mod gateway;
mod transport;

pub use error::LlmError;
pub use extraction::extract_json;
pub use gateway::{GatewayConfig, Generation, LlmGateway, RetryPolicy};
pub use transport::{
    ChatCompletion, ChatMessage, ChatRequest, ChatTransport, OpenAiConfig, OpenAiTransport,
    mask_key,
};

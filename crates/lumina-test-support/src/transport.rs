//! Scripted chat transports for driving the gateway in tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use lumina_llm::{ChatCompletion, ChatRequest, ChatTransport, LlmError};
use tokio::sync::Semaphore;

/// Builds a successful completion.
///
/// # Errors
///
/// Never; the `Result` matches the transport's return type so replies can
/// be queued next to failures.
pub fn reply(text: impl Into<String>, tokens: u64) -> Result<ChatCompletion, LlmError> {
    Ok(ChatCompletion {
        content: text.into(),
        total_tokens: tokens,
    })
}

type CallHook = Box<dyn Fn(usize, &ChatRequest) + Send + Sync>;

/// A transport that answers from a queue of scripted replies.
///
/// When the queue is empty the fallback reply is used; without a fallback
/// the call fails with `LlmError::Http`. Every request is recorded.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<ChatCompletion, LlmError>>>,
    fallback: Option<(String, u64)>,
    on_call: Option<CallHook>,
    gate: Option<Arc<Semaphore>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<ChatRequest>>,
}

impl std::fmt::Debug for ScriptedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedTransport")
            .field("calls", &self.calls())
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}

impl ScriptedTransport {
    /// Creates a transport with no scripted replies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues replies in call order.
    #[must_use]
    pub fn with_replies(
        self,
        replies: impl IntoIterator<Item = Result<ChatCompletion, LlmError>>,
    ) -> Self {
        self.replies
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .extend(replies);
        self
    }

    /// Answers with `text` once the queue is drained.
    #[must_use]
    pub fn with_fallback(mut self, text: impl Into<String>, tokens: u64) -> Self {
        self.fallback = Some((text.into(), tokens));
        self
    }

    /// Runs `hook` with the 1-based call number before each reply.
    #[must_use]
    pub fn on_call(mut self, hook: impl Fn(usize, &ChatRequest) + Send + Sync + 'static) -> Self {
        self.on_call = Some(Box::new(hook));
        self
    }

    /// Makes each call wait for a permit on `gate`, which the test releases.
    #[must_use]
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Number of calls received.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatCompletion, LlmError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().unwrap().push(request.clone());
        if let Some(hook) = &self.on_call {
            hook(call, request);
        }
        if let Some(gate) = &self.gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|e| LlmError::Http(e.to_string()))?;
            permit.forget();
        }

        let scripted = self.replies.lock().unwrap().pop_front();
        match (scripted, &self.fallback) {
            (Some(result), _) => result,
            (None, Some((text, tokens))) => reply(text.clone(), *tokens),
            (None, None) => Err(LlmError::Http("no scripted reply".into())),
        }
    }
}

/// A transport that always fails with a network error.
#[derive(Debug, Default)]
pub struct FailingTransport {
    calls: AtomicUsize,
}

impl FailingTransport {
    /// Number of calls received.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatTransport for FailingTransport {
    async fn complete(&self, _request: &ChatRequest) -> Result<ChatCompletion, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(LlmError::Http("connection reset by peer".into()))
    }
}

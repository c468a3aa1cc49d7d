//! Shared application state.

use std::sync::Arc;

use lumina_bible::application::resolver::InteractionResolver;
use lumina_core::clock::Clock;
use lumina_core::repository::{AiLogRepository, ProjectRepository, SceneRepository};
use lumina_llm::LlmGateway;
use lumina_screenplay::application::deps::GenerationDeps;
use lumina_screenplay::application::supervisor::GenerationSupervisor;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Project store.
    pub projects: Arc<dyn ProjectRepository>,
    /// Scene store.
    pub scenes: Arc<dyn SceneRepository>,
    /// AI call log.
    pub ai_logs: Arc<dyn AiLogRepository>,
    /// The process-wide LLM gateway.
    pub gateway: Arc<LlmGateway>,
    /// Clock for timestamps.
    pub clock: Arc<dyn Clock>,
    /// Owner of every background generation run.
    pub supervisor: Arc<GenerationSupervisor>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("gateway", &self.gateway)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create new application state, with a supervisor whose planner asks
    /// for `outline_batch_size` units per call.
    #[must_use]
    pub fn new(deps: GenerationDeps, outline_batch_size: u32) -> Self {
        let supervisor = Arc::new(GenerationSupervisor::new(deps.clone(), outline_batch_size));
        Self {
            projects: deps.projects,
            scenes: deps.scenes,
            ai_logs: deps.ai_logs,
            gateway: deps.gateway,
            clock: deps.clock,
            supervisor,
        }
    }

    /// A questionnaire resolver borrowing this state's collaborators.
    #[must_use]
    pub fn resolver(&self) -> InteractionResolver<'_> {
        InteractionResolver::new(
            &*self.projects,
            &*self.ai_logs,
            &self.gateway,
            self.clock.as_ref(),
        )
    }
}

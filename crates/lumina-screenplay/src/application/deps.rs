//! Collaborators shared by the background generation units.

use std::sync::Arc;

use lumina_core::clock::Clock;
use lumina_core::repository::{AiLogRepository, ProjectRepository, SceneRepository};
use lumina_llm::LlmGateway;

/// Owned handles to everything a planning or content run touches. Cheap
/// to clone into spawned tasks.
#[derive(Clone)]
pub struct GenerationDeps {
    /// Project store.
    pub projects: Arc<dyn ProjectRepository>,
    /// Scene store.
    pub scenes: Arc<dyn SceneRepository>,
    /// AI call log.
    pub ai_logs: Arc<dyn AiLogRepository>,
    /// The process-wide LLM gateway.
    pub gateway: Arc<LlmGateway>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for GenerationDeps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationDeps")
            .field("gateway", &self.gateway)
            .finish_non_exhaustive()
    }
}

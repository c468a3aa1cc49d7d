//! Fixtures shared by the unit tests of this crate.

use std::sync::Arc;

use lumina_core::model::{Project, ProjectType};
use lumina_core::repository::{AiLogRepository, ProjectRepository, SceneRepository};
use lumina_llm::{ChatTransport, GatewayConfig, LlmGateway, RetryPolicy};
use lumina_test_support::{FixedClock, InMemoryStore, fixed_now};
use uuid::Uuid;

use crate::application::deps::GenerationDeps;

pub(crate) fn gateway(transport: Arc<dyn ChatTransport>) -> Arc<LlmGateway> {
    Arc::new(LlmGateway::new(
        transport,
        GatewayConfig {
            retry: RetryPolicy::immediate(3),
            ..GatewayConfig::default()
        },
    ))
}

pub(crate) fn deps(store: &Arc<InMemoryStore>, transport: Arc<dyn ChatTransport>) -> GenerationDeps {
    GenerationDeps {
        projects: store.clone(),
        scenes: store.clone(),
        ai_logs: store.clone(),
        gateway: gateway(transport),
        clock: Arc::new(FixedClock::default()),
    }
}

pub(crate) fn deps_with_store<S>(store: Arc<S>, transport: Arc<dyn ChatTransport>) -> GenerationDeps
where
    S: ProjectRepository + SceneRepository + AiLogRepository + 'static,
{
    GenerationDeps {
        projects: store.clone(),
        scenes: store.clone(),
        ai_logs: store,
        gateway: gateway(transport),
        clock: Arc::new(FixedClock::default()),
    }
}

pub(crate) fn seed_project(store: &InMemoryStore, project_type: ProjectType) -> Project {
    let mut project = Project::new(
        Uuid::new_v4(),
        "Untitled Script".to_owned(),
        "A retired thief is pulled into one last heist.".to_owned(),
        fixed_now(),
    );
    project.project_type = project_type;
    store.seed_project(project.clone());
    project
}

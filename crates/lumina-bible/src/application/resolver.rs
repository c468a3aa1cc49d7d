//! The interaction resolver: decides which question comes next, produces
//! its options, and records answers.

use lumina_core::bible::{StepKey, StoryBible};
use lumina_core::clock::Clock;
use lumina_core::error::DomainError;
use lumina_core::model::{AiAction, CachedInteraction, Project, ProjectType};
use lumina_core::repository::{AiLogRepository, ProjectRepository, find_owned};
use lumina_core::usage::{Usage, record_usage};
use lumina_llm::LlmGateway;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::application::prompts;
use crate::domain::interaction::{
    ChoiceOption, Interaction, InteractionPayload, Progress, context_fingerprint,
};
use crate::domain::steps::{RESET_VALUE, StepDefinition, is_relevant, relevant_steps, summarize};

/// Message returned once every relevant step has an answer.
pub const COMPLETED_MESSAGE: &str = "Story bible complete. Ready to generate the screenplay.";

const OPTIONS_TEMPERATURE: f32 = 0.8;

/// Options offered when the model's reply cannot be used.
const FALLBACK_OPTIONS: &[(&str, &str)] = &[
    ("Standard/Classic Approach", "classic"),
    ("Subversive/Twist Approach", "subversive"),
    ("Experimental Approach", "experimental"),
];

#[derive(Debug, Deserialize)]
struct GeneratedOptions {
    #[serde(default)]
    question: String,
    #[serde(default)]
    options: Vec<ChoiceOption>,
}

/// Walks a project through the story-bible questionnaire.
#[derive(Clone, Copy)]
pub struct InteractionResolver<'a> {
    projects: &'a dyn ProjectRepository,
    ai_logs: &'a dyn AiLogRepository,
    gateway: &'a LlmGateway,
    clock: &'a dyn Clock,
}

impl std::fmt::Debug for InteractionResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionResolver")
            .field("gateway", self.gateway)
            .finish_non_exhaustive()
    }
}

impl<'a> InteractionResolver<'a> {
    /// Creates a resolver over the given collaborators.
    #[must_use]
    pub fn new(
        projects: &'a dyn ProjectRepository,
        ai_logs: &'a dyn AiLogRepository,
        gateway: &'a LlmGateway,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            projects,
            ai_logs,
            gateway,
            clock,
        }
    }

    /// Returns the next interaction for the caller's project.
    ///
    /// Re-polling without an intervening context change returns the cached
    /// payload and never calls the model again.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ProjectNotFound` for missing or foreign
    /// projects, `DomainError::Upstream` if options had to be generated and
    /// the gateway gave up, or `DomainError::Infrastructure` on store
    /// failures.
    #[instrument(skip(self))]
    pub async fn resolve(&self, project_id: Uuid, caller: Uuid) -> Result<Interaction, DomainError> {
        let project = find_owned(self.projects, project_id, caller).await?;
        self.resolve_for(&project).await
    }

    /// Records an answer and returns the next interaction.
    ///
    /// Answering `project_type` also sets the project type and drops
    /// answers to steps the new type does not ask. Answering `confirmation`
    /// with `reset` forgets everything instead; see [`Self::reset`].
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for unknown fields, blank values,
    /// unknown project types, or steps that do not apply to the project,
    /// plus every error [`Self::resolve`] can return.
    #[instrument(skip(self, value))]
    pub async fn submit_answer(
        &self,
        project_id: Uuid,
        caller: Uuid,
        field: &str,
        value: &str,
    ) -> Result<Interaction, DomainError> {
        let key: StepKey = field
            .parse()
            .map_err(|e| DomainError::Validation(format!("{e}")))?;
        let value = value.trim();
        if value.is_empty() {
            return Err(DomainError::Validation(format!(
                "answer for {key} must not be blank"
            )));
        }

        let mut project = find_owned(self.projects, project_id, caller).await?;

        if key == StepKey::Confirmation && value.eq_ignore_ascii_case(RESET_VALUE) {
            return self.reset_project(project).await;
        }

        if !relevant_steps(project.project_type)
            .iter()
            .any(|s| s.key == key)
        {
            return Err(DomainError::Validation(format!(
                "step {key} does not apply to {} projects",
                project.project_type
            )));
        }

        let mut answers = project.answers.clone();
        let value = if key == StepKey::ProjectType {
            let project_type: ProjectType = value.parse()?;
            if project_type == ProjectType::Pending {
                return Err(DomainError::Validation(
                    "project type must be movie, tv, or short".to_owned(),
                ));
            }
            retain_relevant(&mut answers, project_type);
            project.project_type = project_type;
            project_type.as_str().to_owned()
        } else {
            value.to_owned()
        };
        answers.insert(key, value);

        self.save_context(&project, &answers).await?;
        info!(field = %key, answered = answers.len(), "answer recorded");

        project.answers = answers;
        project.next_interaction = None;
        self.resolve_for(&project).await
    }

    /// Forgets every answer and the project type, returning the project to
    /// its initial setup state. The cache is left empty.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ProjectNotFound` for missing or foreign
    /// projects, or `DomainError::Infrastructure` on store failures.
    #[instrument(skip(self))]
    pub async fn reset(&self, project_id: Uuid, caller: Uuid) -> Result<Interaction, DomainError> {
        let project = find_owned(self.projects, project_id, caller).await?;
        self.reset_project(project).await
    }

    async fn reset_project(&self, mut project: Project) -> Result<Interaction, DomainError> {
        project.project_type = ProjectType::Pending;
        project.answers = StoryBible::new();
        project.next_interaction = None;
        self.save_context(&project, &project.answers).await?;
        info!(project_id = %project.id, "story bible reset");

        // The first step is a fixed choice, so this never calls the model.
        self.compute(&project).await
    }

    async fn save_context(&self, project: &Project, answers: &StoryBible) -> Result<(), DomainError> {
        let saved = self
            .projects
            .save_context(project.id, project.project_type, answers, self.clock.now())
            .await?;
        if saved {
            Ok(())
        } else {
            Err(DomainError::ProjectNotFound(project.id))
        }
    }

    async fn resolve_for(&self, project: &Project) -> Result<Interaction, DomainError> {
        let fingerprint = context_fingerprint(project);

        if let Some(cached) = &project.next_interaction
            && cached.fingerprint == fingerprint
        {
            match serde_json::from_value::<Interaction>(cached.payload.clone()) {
                Ok(interaction) => {
                    debug!(project_id = %project.id, "serving cached interaction");
                    return Ok(interaction);
                }
                Err(e) => {
                    warn!(project_id = %project.id, error = %e, "discarding unreadable cached interaction");
                }
            }
        }

        let interaction = self.compute(project).await?;
        let payload = serde_json::to_value(&interaction)
            .map_err(|e| DomainError::Infrastructure(format!("interaction serialization failed: {e}")))?;
        self.projects
            .cache_interaction(
                project.id,
                &CachedInteraction {
                    fingerprint,
                    payload,
                },
            )
            .await?;
        Ok(interaction)
    }

    async fn compute(&self, project: &Project) -> Result<Interaction, DomainError> {
        let steps = relevant_steps(project.project_type);
        let total = steps.len();
        let next = steps
            .iter()
            .enumerate()
            .find(|(_, s)| !project.answers.contains(s.key));

        let Some((position, step)) = next else {
            return Ok(Interaction::Completed {
                message: COMPLETED_MESSAGE.to_owned(),
            });
        };
        let progress = Progress {
            current: position + 1,
            total,
        };

        if step.terminal {
            return Ok(Interaction::Confirmation {
                payload: InteractionPayload {
                    field: step.key,
                    question: step.question.to_owned(),
                    options: ChoiceOption::from_fixed(step.options),
                    progress,
                    summary: Some(summarize(&project.answers)),
                },
            });
        }

        if !step.is_generated() {
            return Ok(Interaction::FixedChoice {
                payload: InteractionPayload {
                    field: step.key,
                    question: step.question.to_owned(),
                    options: ChoiceOption::from_fixed(step.options),
                    progress,
                    summary: None,
                },
            });
        }

        let (question, options) = self.generate_options(project, step).await?;
        Ok(Interaction::GeneratedChoice {
            payload: InteractionPayload {
                field: step.key,
                question,
                options,
                progress,
                summary: None,
            },
        })
    }

    async fn generate_options(
        &self,
        project: &Project,
        step: &StepDefinition,
    ) -> Result<(String, Vec<ChoiceOption>), DomainError> {
        let messages = prompts::step_options(project, step);
        let prompt = prompts::transcript(&messages);

        let generation = self
            .gateway
            .generate(messages, OPTIONS_TEMPERATURE, true)
            .await
            .map_err(|e| DomainError::Upstream(e.to_string()))?;

        record_usage(
            self.projects,
            self.ai_logs,
            self.clock,
            Usage {
                owner_id: project.owner_id,
                project_id: project.id,
                action: AiAction::StepOptions,
                prompt: &prompt,
                response: &generation.text,
                tokens: generation.tokens,
            },
        )
        .await;

        let generated = generation
            .parse_json::<GeneratedOptions>()
            .filter(|g| !g.options.is_empty());
        match generated {
            Some(g) => {
                let question = if g.question.trim().is_empty() {
                    step.question.to_owned()
                } else {
                    g.question
                };
                Ok((question, g.options))
            }
            None => {
                warn!(project_id = %project.id, field = %step.key, "using fallback options");
                Ok((
                    step.question.to_owned(),
                    ChoiceOption::from_fixed(FALLBACK_OPTIONS),
                ))
            }
        }
    }
}

fn retain_relevant(answers: &mut StoryBible, project_type: ProjectType) {
    let stale: Vec<StepKey> = answers
        .iter()
        .map(|(key, _)| key)
        .filter(|key| !is_relevant(*key, project_type))
        .collect();
    for key in stale {
        answers.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use lumina_core::model::ProcessingStatus;
    use lumina_llm::{GatewayConfig, RetryPolicy};
    use lumina_test_support::{
        FailingTransport, FixedClock, InMemoryStore, ScriptedTransport, fixed_now, reply,
    };

    use super::*;

    const OPTIONS_JSON: &str = r#"Here you go: {"question":"Which genre?","options":[{"label":"Neo-noir","value":"noir"},{"label":"Folk horror","value":"folk_horror"}]}"#;

    fn gateway(transport: Arc<dyn lumina_llm::ChatTransport>) -> LlmGateway {
        LlmGateway::new(
            transport,
            GatewayConfig {
                retry: RetryPolicy::immediate(3),
                ..GatewayConfig::default()
            },
        )
    }

    fn seed(store: &InMemoryStore, project_type: ProjectType, answers: &[(StepKey, &str)]) -> Project {
        let mut project = Project::new(
            Uuid::new_v4(),
            "Untitled Script".to_owned(),
            "A lighthouse keeper finds a door in the sea.".to_owned(),
            fixed_now(),
        );
        project.project_type = project_type;
        for (key, value) in answers {
            project.answers.insert(*key, *value);
        }
        store.seed_project(project.clone());
        project
    }

    fn all_answers(project_type: ProjectType) -> Vec<(StepKey, &'static str)> {
        relevant_steps(project_type)
            .iter()
            .filter(|s| !s.terminal)
            .map(|s| (s.key, "12"))
            .collect()
    }

    #[tokio::test]
    async fn test_new_project_is_asked_for_its_type_first() {
        // Arrange
        let store = InMemoryStore::new();
        let transport = Arc::new(ScriptedTransport::new());
        let gateway = gateway(transport.clone());
        let clock = FixedClock::default();
        let project = seed(&store, ProjectType::Pending, &[]);
        let resolver = InteractionResolver::new(&store, &store, &gateway, &clock);

        // Act
        let interaction = resolver.resolve(project.id, project.owner_id).await.unwrap();

        // Assert
        let Interaction::FixedChoice { payload } = interaction else {
            panic!("expected fixed choice");
        };
        assert_eq!(payload.field, StepKey::ProjectType);
        assert_eq!(payload.progress, Progress { current: 1, total: 8 });
        let values: Vec<&str> = payload.options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, vec!["movie", "tv", "short"]);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_progress_denominator_matches_relevant_step_count_for_every_type() {
        for project_type in [
            ProjectType::Pending,
            ProjectType::Movie,
            ProjectType::Tv,
            ProjectType::Short,
        ] {
            // Arrange
            let store = InMemoryStore::new();
            let transport = Arc::new(ScriptedTransport::new().with_fallback(OPTIONS_JSON, 5));
            let gateway = gateway(transport);
            let clock = FixedClock::default();
            let resolver = InteractionResolver::new(&store, &store, &gateway, &clock);
            let mut answered = Vec::new();
            let expected_total = relevant_steps(project_type).len();

            // Act: walk every step
            let project = seed(&store, project_type, &[]);
            loop {
                let interaction = resolver.resolve(project.id, project.owner_id).await.unwrap();
                let Some(payload) = interaction.payload() else {
                    break;
                };

                // Assert
                assert_eq!(payload.progress.total, expected_total);
                assert_eq!(payload.progress.current, answered.len() + 1);
                if payload.field == StepKey::ProjectType && project_type == ProjectType::Pending {
                    break;
                }
                let value = if payload.field == StepKey::ProjectType {
                    project_type.as_str().to_owned()
                } else {
                    payload.options[0].value.clone()
                };
                resolver
                    .submit_answer(project.id, project.owner_id, payload.field.as_str(), &value)
                    .await
                    .unwrap();
                answered.push(payload.field);
            }
        }
    }

    #[tokio::test]
    async fn test_repeated_resolve_is_identical_and_calls_the_model_once() {
        // Arrange
        let store = InMemoryStore::new();
        let transport = Arc::new(ScriptedTransport::new().with_replies([reply(OPTIONS_JSON, 42)]));
        let gateway = gateway(transport.clone());
        let clock = FixedClock::default();
        let project = seed(&store, ProjectType::Movie, &[(StepKey::ProjectType, "movie")]);
        let resolver = InteractionResolver::new(&store, &store, &gateway, &clock);

        // Act
        let first = resolver.resolve(project.id, project.owner_id).await.unwrap();
        let second = resolver.resolve(project.id, project.owner_id).await.unwrap();

        // Assert
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        assert_eq!(transport.calls(), 1);
        let Interaction::GeneratedChoice { payload } = first else {
            panic!("expected generated choice");
        };
        assert_eq!(payload.field, StepKey::Genre);
        assert_eq!(payload.question, "Which genre?");
        assert_eq!(payload.options.len(), 2);

        let stored = store.project(project.id).unwrap();
        assert_eq!(stored.total_tokens, 42);
        assert_eq!(store.ai_logs().len(), 1);
        assert_eq!(store.ai_logs()[0].action, AiAction::StepOptions);
    }

    #[tokio::test]
    async fn test_answer_invalidates_cache_and_next_resolve_reflects_new_state() {
        // Arrange
        let store = InMemoryStore::new();
        let transport = Arc::new(ScriptedTransport::new().with_fallback(OPTIONS_JSON, 10));
        let gateway = gateway(transport.clone());
        let clock = FixedClock::default();
        let project = seed(&store, ProjectType::Movie, &[(StepKey::ProjectType, "movie")]);
        let resolver = InteractionResolver::new(&store, &store, &gateway, &clock);
        let before = resolver.resolve(project.id, project.owner_id).await.unwrap();

        // Act
        let after = resolver
            .submit_answer(project.id, project.owner_id, "genre", "noir")
            .await
            .unwrap();
        let polled = resolver.resolve(project.id, project.owner_id).await.unwrap();

        // Assert
        assert_eq!(before.field(), Some(StepKey::Genre));
        assert_eq!(after.field(), Some(StepKey::Tone));
        assert_eq!(polled, after);
        assert_eq!(transport.calls(), 2);
        let stored = store.project(project.id).unwrap();
        assert_eq!(stored.answers.get(StepKey::Genre), Some("noir"));
        assert_eq!(
            stored.next_interaction.unwrap().fingerprint,
            context_fingerprint(&stored_without_cache(&store, project.id))
        );
    }

    fn stored_without_cache(store: &InMemoryStore, project_id: Uuid) -> Project {
        let mut project = store.project(project_id).unwrap();
        project.next_interaction = None;
        project
    }

    #[tokio::test]
    async fn test_stale_cached_payload_is_recomputed() {
        // Arrange
        let store = InMemoryStore::new();
        let transport = Arc::new(ScriptedTransport::new());
        let gateway = gateway(transport);
        let clock = FixedClock::default();
        let mut project = seed(&store, ProjectType::Pending, &[]);
        project.next_interaction = Some(CachedInteraction {
            fingerprint: "stale".to_owned(),
            payload: serde_json::json!({"type": "completed", "message": "old"}),
        });
        store.seed_project(project.clone());
        let resolver = InteractionResolver::new(&store, &store, &gateway, &clock);

        // Act
        let interaction = resolver.resolve(project.id, project.owner_id).await.unwrap();

        // Assert
        assert_eq!(interaction.field(), Some(StepKey::ProjectType));
    }

    #[tokio::test]
    async fn test_unparseable_options_fall_back_to_generic_choices_and_still_count_tokens() {
        // Arrange
        let store = InMemoryStore::new();
        let transport = Arc::new(ScriptedTransport::new().with_replies([reply("I cannot do that.", 17)]));
        let gateway = gateway(transport);
        let clock = FixedClock::default();
        let project = seed(&store, ProjectType::Tv, &[(StepKey::ProjectType, "tv")]);
        let resolver = InteractionResolver::new(&store, &store, &gateway, &clock);

        // Act
        let interaction = resolver.resolve(project.id, project.owner_id).await.unwrap();

        // Assert
        let Interaction::GeneratedChoice { payload } = interaction else {
            panic!("expected generated choice");
        };
        let values: Vec<&str> = payload.options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, vec!["classic", "subversive", "experimental"]);
        assert_eq!(payload.question, "Which genre best fits this story?");
        assert_eq!(store.project(project.id).unwrap().total_tokens, 17);
    }

    #[tokio::test]
    async fn test_upstream_failure_surfaces_as_upstream_error_after_retries() {
        // Arrange
        let store = InMemoryStore::new();
        let transport = Arc::new(FailingTransport::default());
        let gateway = gateway(transport.clone());
        let clock = FixedClock::default();
        let project = seed(&store, ProjectType::Movie, &[(StepKey::ProjectType, "movie")]);
        let resolver = InteractionResolver::new(&store, &store, &gateway, &clock);

        // Act
        let result = resolver.resolve(project.id, project.owner_id).await;

        // Assert
        assert!(matches!(result, Err(DomainError::Upstream(_))));
        assert_eq!(transport.calls(), 3);
        assert!(store.project(project.id).unwrap().next_interaction.is_none());
        assert!(store.ai_logs().is_empty());
    }

    #[tokio::test]
    async fn test_project_type_answer_sets_type_and_accepts_aliases() {
        // Arrange
        let store = InMemoryStore::new();
        let transport = Arc::new(ScriptedTransport::new().with_fallback(OPTIONS_JSON, 1));
        let gateway = gateway(transport);
        let clock = FixedClock::default();
        let project = seed(&store, ProjectType::Pending, &[]);
        let resolver = InteractionResolver::new(&store, &store, &gateway, &clock);

        // Act
        let next = resolver
            .submit_answer(project.id, project.owner_id, "type", "Film")
            .await
            .unwrap();

        // Assert
        let stored = store.project(project.id).unwrap();
        assert_eq!(stored.project_type, ProjectType::Movie);
        assert_eq!(stored.answers.get(StepKey::ProjectType), Some("movie"));
        let payload = next.payload().unwrap();
        assert_eq!(payload.field, StepKey::Genre);
        assert_eq!(payload.progress, Progress { current: 2, total: 10 });
    }

    #[tokio::test]
    async fn test_switching_type_drops_answers_the_new_type_does_not_ask() {
        // Arrange
        let store = InMemoryStore::new();
        let transport = Arc::new(ScriptedTransport::new().with_fallback(OPTIONS_JSON, 1));
        let gateway = gateway(transport);
        let clock = FixedClock::default();
        let project = seed(
            &store,
            ProjectType::Movie,
            &[
                (StepKey::ProjectType, "movie"),
                (StepKey::Genre, "noir"),
                (StepKey::SceneCount, "60"),
            ],
        );
        let resolver = InteractionResolver::new(&store, &store, &gateway, &clock);

        // Act
        resolver
            .submit_answer(project.id, project.owner_id, "project_type", "tv")
            .await
            .unwrap();

        // Assert
        let stored = store.project(project.id).unwrap();
        assert_eq!(stored.project_type, ProjectType::Tv);
        assert_eq!(stored.answers.get(StepKey::Genre), Some("noir"));
        assert!(!stored.answers.contains(StepKey::SceneCount));
    }

    #[tokio::test]
    async fn test_answers_to_irrelevant_unknown_or_blank_steps_are_rejected() {
        // Arrange
        let store = InMemoryStore::new();
        let transport = Arc::new(ScriptedTransport::new());
        let gateway = gateway(transport);
        let clock = FixedClock::default();
        let project = seed(&store, ProjectType::Movie, &[(StepKey::ProjectType, "movie")]);
        let resolver = InteractionResolver::new(&store, &store, &gateway, &clock);

        // Act
        let irrelevant = resolver
            .submit_answer(project.id, project.owner_id, "episode_count", "12")
            .await;
        let unknown = resolver
            .submit_answer(project.id, project.owner_id, "mood_board", "x")
            .await;
        let blank = resolver
            .submit_answer(project.id, project.owner_id, "genre", "   ")
            .await;
        let bad_type = resolver
            .submit_answer(project.id, project.owner_id, "project_type", "opera")
            .await;

        // Assert
        for result in [irrelevant, unknown, blank, bad_type] {
            assert!(matches!(result, Err(DomainError::Validation(_))), "{result:?}");
        }
        assert_eq!(store.project(project.id).unwrap().answers.len(), 1);
    }

    #[tokio::test]
    async fn test_foreign_caller_gets_not_found() {
        // Arrange
        let store = InMemoryStore::new();
        let transport = Arc::new(ScriptedTransport::new());
        let gateway = gateway(transport);
        let clock = FixedClock::default();
        let project = seed(&store, ProjectType::Pending, &[]);
        let resolver = InteractionResolver::new(&store, &store, &gateway, &clock);

        // Act
        let resolved = resolver.resolve(project.id, Uuid::new_v4()).await;
        let submitted = resolver
            .submit_answer(project.id, Uuid::new_v4(), "project_type", "movie")
            .await;

        // Assert
        assert!(matches!(resolved, Err(DomainError::ProjectNotFound(id)) if id == project.id));
        assert!(matches!(submitted, Err(DomainError::ProjectNotFound(_))));
    }

    #[tokio::test]
    async fn test_confirmation_summarizes_answers_then_completes() {
        // Arrange
        let store = InMemoryStore::new();
        let transport = Arc::new(ScriptedTransport::new());
        let gateway = gateway(transport.clone());
        let clock = FixedClock::default();
        let answers = all_answers(ProjectType::Short);
        let project = seed(&store, ProjectType::Short, &answers);
        let resolver = InteractionResolver::new(&store, &store, &gateway, &clock);

        // Act
        let confirmation = resolver.resolve(project.id, project.owner_id).await.unwrap();
        let completed = resolver
            .submit_answer(project.id, project.owner_id, "confirmation", "confirm")
            .await
            .unwrap();

        // Assert
        let Interaction::Confirmation { payload } = confirmation else {
            panic!("expected confirmation");
        };
        assert_eq!(payload.progress, Progress { current: 10, total: 10 });
        let summary = payload.summary.unwrap();
        assert!(summary.contains("Episode count: 12"));
        assert!(summary.contains("Genre: 12"));
        let values: Vec<&str> = payload.options.iter().map(|o| o.value.as_str()).collect();
        assert_eq!(values, vec!["confirm", "reset"]);
        assert_eq!(
            completed,
            Interaction::Completed {
                message: COMPLETED_MESSAGE.to_owned()
            }
        );
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_reset_clears_answers_type_and_cache_from_any_state() {
        for project_type in [ProjectType::Pending, ProjectType::Movie, ProjectType::Tv] {
            // Arrange
            let store = InMemoryStore::new();
            let transport = Arc::new(ScriptedTransport::new());
            let gateway = gateway(transport);
            let clock = FixedClock::default();
            let mut project = seed(&store, project_type, &all_answers(project_type));
            project.next_interaction = Some(CachedInteraction {
                fingerprint: "anything".to_owned(),
                payload: serde_json::json!({}),
            });
            project.status = ProcessingStatus::Completed;
            store.seed_project(project.clone());
            let resolver = InteractionResolver::new(&store, &store, &gateway, &clock);

            // Act
            let next = resolver
                .submit_answer(project.id, project.owner_id, "confirmation", "reset")
                .await
                .unwrap();

            // Assert
            let stored = store.project(project.id).unwrap();
            assert!(stored.answers.is_empty());
            assert_eq!(stored.project_type, ProjectType::Pending);
            assert!(stored.next_interaction.is_none());
            assert_eq!(next.field(), Some(StepKey::ProjectType));
        }
    }
}

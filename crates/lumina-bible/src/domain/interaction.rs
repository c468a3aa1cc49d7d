//! The interaction protocol returned to the caller after every step.

use lumina_core::bible::StepKey;
use lumina_core::model::Project;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::steps::FixedOption;

/// One selectable answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    /// Text shown to the user.
    pub label: String,
    /// Value submitted back as the answer.
    pub value: String,
}

impl ChoiceOption {
    /// Converts static catalog options.
    #[must_use]
    pub fn from_fixed(options: &[FixedOption]) -> Vec<Self> {
        options
            .iter()
            .map(|(label, value)| Self {
                label: (*label).to_owned(),
                value: (*value).to_owned(),
            })
            .collect()
    }
}

/// Position of the current step within the project's relevant steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// 1-based position of the step being asked.
    pub current: usize,
    /// Number of relevant steps for the project.
    pub total: usize,
}

/// Body of a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionPayload {
    /// Step being asked.
    pub field: StepKey,
    /// Question text.
    pub question: String,
    /// Choices offered.
    pub options: Vec<ChoiceOption>,
    /// Step progress.
    pub progress: Progress,
    /// Rendering of every collected answer; confirmation step only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// What the caller should show next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Interaction {
    /// A step with a static option list.
    FixedChoice {
        /// Question body.
        payload: InteractionPayload,
    },
    /// A step whose options were synthesized by the LLM.
    GeneratedChoice {
        /// Question body.
        payload: InteractionPayload,
    },
    /// The terminal confirmation step.
    Confirmation {
        /// Question body, with `summary` set.
        payload: InteractionPayload,
    },
    /// Every relevant step has an answer.
    Completed {
        /// Message for the user.
        message: String,
    },
}

impl Interaction {
    /// Returns the step being asked, or `None` once completed.
    #[must_use]
    pub fn field(&self) -> Option<StepKey> {
        self.payload().map(|p| p.field)
    }

    /// Returns the question body, or `None` once completed.
    #[must_use]
    pub fn payload(&self) -> Option<&InteractionPayload> {
        match self {
            Self::FixedChoice { payload }
            | Self::GeneratedChoice { payload }
            | Self::Confirmation { payload } => Some(payload),
            Self::Completed { .. } => None,
        }
    }
}

/// Digest of everything an interaction is computed from.
///
/// A cached interaction is only served when its fingerprint equals the
/// project's current one.
#[must_use]
pub fn context_fingerprint(project: &Project) -> String {
    let mut hasher = Sha256::new();
    hasher.update(project.logline.as_bytes());
    hasher.update([0u8]);
    hasher.update(project.project_type.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(project.answers.snapshot_json().as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use lumina_core::model::ProjectType;
    use lumina_test_support::fixed_now;
    use serde_json::json;
    use uuid::Uuid;

    use super::*;

    fn project() -> Project {
        Project::new(
            Uuid::new_v4(),
            "Untitled Script".to_owned(),
            "A lighthouse keeper finds a door in the sea.".to_owned(),
            fixed_now(),
        )
    }

    #[test]
    fn test_choice_serializes_with_type_tag_and_payload() {
        let interaction = Interaction::FixedChoice {
            payload: InteractionPayload {
                field: StepKey::ProjectType,
                question: "What kind?".to_owned(),
                options: vec![ChoiceOption {
                    label: "Feature film".to_owned(),
                    value: "movie".to_owned(),
                }],
                progress: Progress {
                    current: 1,
                    total: 8,
                },
                summary: None,
            },
        };

        let value = serde_json::to_value(&interaction).unwrap();

        assert_eq!(
            value,
            json!({
                "type": "fixed_choice",
                "payload": {
                    "field": "project_type",
                    "question": "What kind?",
                    "options": [{"label": "Feature film", "value": "movie"}],
                    "progress": {"current": 1, "total": 8}
                }
            })
        );
    }

    #[test]
    fn test_completed_serializes_with_message() {
        let value = serde_json::to_value(Interaction::Completed {
            message: "done".to_owned(),
        })
        .unwrap();

        assert_eq!(value, json!({"type": "completed", "message": "done"}));
    }

    #[test]
    fn test_fingerprint_is_stable_for_identical_context() {
        let project = project();
        let copy = project.clone();

        assert_eq!(context_fingerprint(&project), context_fingerprint(&copy));
        assert_eq!(context_fingerprint(&project).len(), 64);
    }

    #[test]
    fn test_fingerprint_changes_with_every_context_field() {
        let base = project();
        let baseline = context_fingerprint(&base);

        let mut answered = base.clone();
        answered.answers.insert(StepKey::Genre, "noir");
        let mut typed = base.clone();
        typed.project_type = ProjectType::Movie;
        let mut rewritten = base;
        rewritten.logline.push('!');

        assert_ne!(context_fingerprint(&answered), baseline);
        assert_ne!(context_fingerprint(&typed), baseline);
        assert_ne!(context_fingerprint(&rewritten), baseline);
    }
}

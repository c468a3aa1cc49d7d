//! The step catalog and its visibility filter.

use lumina_core::bible::{StepKey, StoryBible};
use lumina_core::model::ProjectType;

/// Which project types a step applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Every project, including one whose type is not chosen yet.
    Always,
    /// Feature films only.
    MovieOnly,
    /// Episodic formats only.
    SerialOnly,
}

impl Visibility {
    /// Returns `true` if a step with this visibility is asked of a project
    /// of `project_type`. Conditional steps stay hidden until the type is
    /// known.
    #[must_use]
    pub fn admits(self, project_type: ProjectType) -> bool {
        match self {
            Self::Always => true,
            Self::MovieOnly => project_type == ProjectType::Movie,
            Self::SerialOnly => project_type.is_serial(),
        }
    }
}

/// A fixed `(label, value)` choice.
pub type FixedOption = (&'static str, &'static str);

/// One question of the questionnaire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepDefinition {
    /// Answer key.
    pub key: StepKey,
    /// Short name used when summarizing answers.
    pub title: &'static str,
    /// Default question text.
    pub question: &'static str,
    /// Static choices. Empty means the options are generated.
    pub options: &'static [FixedOption],
    /// Visibility predicate over the project type.
    pub visibility: Visibility,
    /// Marks the confirmation step.
    pub terminal: bool,
}

impl StepDefinition {
    const fn generated(key: StepKey, title: &'static str, question: &'static str) -> Self {
        Self {
            key,
            title,
            question,
            options: &[],
            visibility: Visibility::Always,
            terminal: false,
        }
    }

    const fn fixed(
        key: StepKey,
        title: &'static str,
        question: &'static str,
        options: &'static [FixedOption],
        visibility: Visibility,
    ) -> Self {
        Self {
            key,
            title,
            question,
            options,
            visibility,
            terminal: false,
        }
    }

    /// Returns `true` if the options come from the LLM.
    #[must_use]
    pub fn is_generated(&self) -> bool {
        self.options.is_empty() && !self.terminal
    }
}

/// Choices offered at the confirmation step.
pub const CONFIRMATION_OPTIONS: &[FixedOption] = &[
    ("Looks good, start writing", "confirm"),
    ("Start over from scratch", "reset"),
];

/// Confirmation answer that forgets every answer.
pub const RESET_VALUE: &str = "reset";

static CATALOG: [StepDefinition; 12] = [
    StepDefinition::fixed(
        StepKey::ProjectType,
        "Project type",
        "What kind of screenplay are you writing?",
        &[
            ("Feature film", "movie"),
            ("Television series", "tv"),
            ("Short-form drama", "short"),
        ],
        Visibility::Always,
    ),
    StepDefinition::generated(
        StepKey::Genre,
        "Genre",
        "Which genre best fits this story?",
    ),
    StepDefinition::generated(
        StepKey::Tone,
        "Tone",
        "What tone should the script strike?",
    ),
    StepDefinition::generated(
        StepKey::Protagonist,
        "Protagonist",
        "Who is the protagonist, and what do they want?",
    ),
    StepDefinition::generated(
        StepKey::Antagonist,
        "Antagonist",
        "Who or what stands in the protagonist's way?",
    ),
    StepDefinition::generated(
        StepKey::WorldSetting,
        "World & setting",
        "Where and when does the story take place?",
    ),
    StepDefinition::generated(
        StepKey::Theme,
        "Theme",
        "What is the story really about underneath the plot?",
    ),
    StepDefinition::fixed(
        StepKey::TargetDuration,
        "Running time (minutes)",
        "How long should the film run?",
        &[
            ("Around 90 minutes", "90"),
            ("Around 120 minutes", "120"),
            ("Around 150 minutes", "150"),
        ],
        Visibility::MovieOnly,
    ),
    StepDefinition::fixed(
        StepKey::SceneCount,
        "Scene count",
        "How many scenes should the outline contain?",
        &[
            ("Tight: 30 scenes", "30"),
            ("Standard: 45 scenes", "45"),
            ("Expansive: 60 scenes", "60"),
        ],
        Visibility::MovieOnly,
    ),
    StepDefinition::fixed(
        StepKey::EpisodeCount,
        "Episode count",
        "How many episodes should the season have?",
        &[
            ("Limited: 6 episodes", "6"),
            ("Standard: 12 episodes", "12"),
            ("Micro-drama: 80 episodes", "80"),
        ],
        Visibility::SerialOnly,
    ),
    StepDefinition::fixed(
        StepKey::EpisodeDuration,
        "Episode length (minutes)",
        "How long is each episode?",
        &[
            ("2 minutes (vertical short)", "2"),
            ("25 minutes", "25"),
            ("45 minutes", "45"),
        ],
        Visibility::SerialOnly,
    ),
    StepDefinition {
        key: StepKey::Confirmation,
        title: "Confirmation",
        question: "Here is your story bible. Ready to start writing?",
        options: CONFIRMATION_OPTIONS,
        visibility: Visibility::Always,
        terminal: true,
    },
];

/// The full catalog, in the order questions are asked.
#[must_use]
pub fn catalog() -> &'static [StepDefinition] {
    &CATALOG
}

/// Looks up a step by key.
#[must_use]
pub fn step(key: StepKey) -> Option<&'static StepDefinition> {
    CATALOG.iter().find(|s| s.key == key)
}

/// Steps asked of a project of `project_type`, in catalog order.
#[must_use]
pub fn relevant_steps(project_type: ProjectType) -> Vec<&'static StepDefinition> {
    CATALOG
        .iter()
        .filter(|s| s.visibility.admits(project_type))
        .collect()
}

/// Returns `true` if `key` is asked of a project of `project_type`.
#[must_use]
pub fn is_relevant(key: StepKey, project_type: ProjectType) -> bool {
    step(key).is_some_and(|s| s.visibility.admits(project_type))
}

/// Returns `true` once every relevant step has an answer.
#[must_use]
pub fn is_complete(project_type: ProjectType, answers: &StoryBible) -> bool {
    project_type != ProjectType::Pending
        && relevant_steps(project_type)
            .iter()
            .all(|s| answers.contains(s.key))
}

/// Human-readable rendering of every collected answer, one per line.
#[must_use]
pub fn summarize(answers: &StoryBible) -> String {
    answers
        .iter()
        .map(|(key, value)| {
            let title = step(key).map_or(key.as_str(), |s| s.title);
            format!("{title}: {value}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

//! The story bible: typed answers keyed by a closed set of step keys.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Identifies one question of the story-bible questionnaire.
///
/// Declaration order is catalog order; `Ord` follows it, so a
/// [`StoryBible`] always iterates and serialises in the order the questions
/// are asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKey {
    /// Movie, TV series, or short-form drama.
    ProjectType,
    /// Genre of the story.
    Genre,
    /// Overall tone.
    Tone,
    /// Who the story follows.
    Protagonist,
    /// Opposing force.
    Antagonist,
    /// Where and when the story happens.
    WorldSetting,
    /// Central theme.
    Theme,
    /// Running time in minutes (movies only).
    TargetDuration,
    /// Number of scenes (movies only).
    SceneCount,
    /// Number of episodes (series only).
    EpisodeCount,
    /// Minutes per episode (series only).
    EpisodeDuration,
    /// Terminal confirmation step.
    Confirmation,
}

impl StepKey {
    /// Every key, in catalog order.
    pub const ALL: [Self; 12] = [
        Self::ProjectType,
        Self::Genre,
        Self::Tone,
        Self::Protagonist,
        Self::Antagonist,
        Self::WorldSetting,
        Self::Theme,
        Self::TargetDuration,
        Self::SceneCount,
        Self::EpisodeCount,
        Self::EpisodeDuration,
        Self::Confirmation,
    ];

    /// Returns the wire name of the key.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProjectType => "project_type",
            Self::Genre => "genre",
            Self::Tone => "tone",
            Self::Protagonist => "protagonist",
            Self::Antagonist => "antagonist",
            Self::WorldSetting => "world_setting",
            Self::Theme => "theme",
            Self::TargetDuration => "target_duration",
            Self::SceneCount => "scene_count",
            Self::EpisodeCount => "episode_count",
            Self::EpisodeDuration => "episode_duration",
            Self::Confirmation => "confirmation",
        }
    }
}

impl fmt::Display for StepKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a known step.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown step key: {0}")]
pub struct UnknownStepKey(pub String);

impl FromStr for StepKey {
    type Err = UnknownStepKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(key) = Self::ALL.into_iter().find(|k| k.as_str() == s) {
            return Ok(key);
        }
        // Names used by earlier versions of the questionnaire.
        match s {
            "type" => Ok(Self::ProjectType),
            "duration" => Ok(Self::TargetDuration),
            "scenes" => Ok(Self::SceneCount),
            "episodes" => Ok(Self::EpisodeCount),
            "setting" => Ok(Self::WorldSetting),
            other => Err(UnknownStepKey(other.to_owned())),
        }
    }
}

/// Answers collected so far, keyed by step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StoryBible(BTreeMap<StepKey, String>);

impl StoryBible {
    /// Creates an empty bible.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the answer for `key`, if any.
    #[must_use]
    pub fn get(&self, key: StepKey) -> Option<&str> {
        self.0.get(&key).map(String::as_str)
    }

    /// Returns `true` if `key` has been answered.
    #[must_use]
    pub fn contains(&self, key: StepKey) -> bool {
        self.0.contains_key(&key)
    }

    /// Records an answer, replacing any previous one.
    pub fn insert(&mut self, key: StepKey, value: impl Into<String>) {
        self.0.insert(key, value.into());
    }

    /// Removes an answer.
    pub fn remove(&mut self, key: StepKey) -> Option<String> {
        self.0.remove(&key)
    }

    /// Forgets every answer.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Number of answered steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing has been answered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates answers in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (StepKey, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Deterministic JSON rendering of the answers, used in prompts and
    /// context fingerprints.
    #[must_use]
    pub fn snapshot_json(&self) -> String {
        // A map of string keys to strings always serialises.
        serde_json::to_string(&self.0).unwrap_or_default()
    }

    /// Builds a bible from a loosely-typed stored map.
    ///
    /// Legacy key names are translated, unknown keys are dropped, and
    /// scalar non-string values are stringified. This is the upgrade path
    /// for rows written before a catalog change.
    #[must_use]
    pub fn from_stored(raw: BTreeMap<String, serde_json::Value>) -> Self {
        let mut bible = Self::new();
        for (name, value) in raw {
            let Ok(key) = name.parse::<StepKey>() else {
                warn!(key = %name, "dropping answer for unknown step");
                continue;
            };
            let value = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => continue,
                other => other.to_string(),
            };
            bible.insert(key, value);
        }
        bible
    }
}

impl<'de> Deserialize<'de> for StoryBible {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
        Ok(Self::from_stored(raw))
    }
}

impl FromIterator<(StepKey, String)> for StoryBible {
    fn from_iter<I: IntoIterator<Item = (StepKey, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

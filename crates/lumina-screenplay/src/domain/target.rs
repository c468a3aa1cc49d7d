//! How many outline units to plan.

use lumina_core::bible::{StepKey, StoryBible};
use lumina_core::model::ProjectType;

/// Scenes planned per minute of running time when only a duration is known.
/// Expressed as a fraction so the floor is exact.
const SCENES_PER_MINUTE: (u32, u32) = (4, 5);

/// Units planned when nothing in the answers pins the count down.
pub const DEFAULT_TARGET: u32 = 5;

/// Upper bound on planned units.
pub const MAX_TARGET: u32 = 300;

/// Derives the number of outline units from the answers.
///
/// Movies use an explicit scene count first, then the running time at 0.8
/// scenes per minute (rounded down). Series use the episode count. Anything
/// unresolvable, including zero, falls back to [`DEFAULT_TARGET`].
#[must_use]
pub fn target_count(project_type: ProjectType, answers: &StoryBible) -> u32 {
    let number = |key| answers.get(key).and_then(first_integer).filter(|n| *n > 0);

    let derived = match project_type {
        ProjectType::Movie => number(StepKey::SceneCount).or_else(|| {
            number(StepKey::TargetDuration)
                .map(|minutes| minutes.saturating_mul(SCENES_PER_MINUTE.0) / SCENES_PER_MINUTE.1)
                .filter(|n| *n > 0)
        }),
        ProjectType::Tv | ProjectType::Short => number(StepKey::EpisodeCount),
        ProjectType::Pending => None,
    };

    derived.unwrap_or(DEFAULT_TARGET).min(MAX_TARGET)
}

/// Parses the first run of ASCII digits in `text`, e.g. `"about 90 min"`.
fn first_integer(text: &str) -> Option<u32> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    Some(digits.parse::<u64>().map_or(u32::MAX, |n| u32::try_from(n).unwrap_or(u32::MAX)))
}

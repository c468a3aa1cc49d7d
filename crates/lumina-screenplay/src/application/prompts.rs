//! Prompt construction for outline batches and scene content.

use lumina_bible::domain::steps::summarize;
use lumina_core::model::Project;
use lumina_llm::ChatMessage;

/// Singular name of an outline unit for the project's format.
pub(crate) fn unit_name(project: &Project) -> &'static str {
    if project.project_type.is_serial() {
        "episode"
    } else {
        "scene"
    }
}

/// Messages asking for outline units `start..=end` of `target`.
pub(crate) fn outline_batch(
    project: &Project,
    style: &str,
    start: u32,
    end: u32,
    target: u32,
    previous_arc: &str,
) -> Vec<ChatMessage> {
    let unit = unit_name(project);
    let system = format!(
        "You are a professional screenwriter developing a {format}.\n\
         Write a concise {unit}-by-{unit} outline for the requested range only. \
         Each outline is two or three sentences covering the dramatic goal, the \
         conflict, and the turn.\n\n\
         Return ONLY a JSON object:\n\
         {{\"scenes\": [{{\"index\": {start}, \"outline\": \"...\"}}]}}",
        format = project.project_type.label(),
    );

    let bible = summarize(&project.answers);
    let arc = if previous_arc.is_empty() {
        "(none, this is the opening)"
    } else {
        previous_arc
    };
    let user = format!(
        "Logline: {logline}\n\
         Style direction: {style}\n\n\
         Story bible:\n{bible}\n\n\
         The full outline has {target} {unit}s. Write {unit}s {start} to {end}.\n\n\
         Previous arc:\n{arc}",
        logline = project.logline,
    );

    vec![ChatMessage::system(system), ChatMessage::user(user)]
}

/// Messages asking for the full script of one scene.
pub(crate) fn scene_content(
    project: &Project,
    style: &str,
    outline: &str,
    rolling_context: &str,
) -> Vec<ChatMessage> {
    let context = if rolling_context.is_empty() {
        "(this is the opening scene)"
    } else {
        rolling_context
    };
    let system = format!(
        "You are a screenwriting engine. Write the full scene in standard \
         screenplay format.\n\n\
         Project logline: {logline}\n\
         Style: {style}\n\n\
         Context from previous scenes:\n{context}\n\n\
         Current scene goal:\n{outline}\n\n\
         Instructions:\n\
         - Use professional screenplay format with INT./EXT. sluglines.\n\
         - Be concise but dramatic.\n\
         - Output only the script text.",
        logline = project.logline,
    );
    vec![ChatMessage::system(system), ChatMessage::user("Action!")]
}

/// Flattens messages into the text stored in the AI log.
pub(crate) fn transcript(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("[{}] {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

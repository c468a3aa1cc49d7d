//! Prompt construction for generated step options.

use lumina_core::model::Project;
use lumina_llm::ChatMessage;

use crate::domain::steps::StepDefinition;

const SYSTEM: &str = "\
You are a professional script consultant helping a writer define the story \
bible of their project one aspect at a time.

Generate 3 or 4 creative, clearly distinct options for the requested aspect.
If the logline or earlier answers already pin this aspect down, offer options \
that refine or challenge that detail instead of restating it. If the context \
is sparse, offer broad, inspiring directions.

Return ONLY a JSON object:
{\"question\": \"the refined question to ask\", \
\"options\": [{\"label\": \"option shown to the writer\", \"value\": \"short answer value\"}]}";

/// Builds the messages asking the model for options for `step`.
pub(crate) fn step_options(project: &Project, step: &StepDefinition) -> Vec<ChatMessage> {
    let user = format!(
        "Context:\n\
         Logline: {logline}\n\
         Format: {format}\n\
         Answers so far: {answers}\n\n\
         Target field: {field}\n\
         Standard question: {question}\n\n\
         Keep the options consistent with the logline. Make one safe, one \
         subversive, and one high-concept.",
        logline = project.logline,
        format = project.project_type.label(),
        answers = project.answers.snapshot_json(),
        field = step.key,
        question = step.question,
    );
    vec![ChatMessage::system(SYSTEM), ChatMessage::user(user)]
}

/// Flattens messages into the text stored in the AI log.
pub(crate) fn transcript(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("[{}] {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

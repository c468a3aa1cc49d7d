//! Pulling a JSON object out of free-form model output.
//!
//! Models wrap JSON in markdown fences or surround it with chatter. The
//! gateway strips fences and keeps the first balanced `{...}` span.

/// Extracts the first balanced JSON object from `text`.
///
/// Markdown code fences are removed first. Braces inside string literals
/// (including escaped quotes) do not count towards nesting. Returns `None`
/// if no complete object is present.
///
/// ```
/// let raw = "Sure! ```json\n{\"a\": 1}\n```";
/// assert_eq!(lumina_llm::extract_json(raw).as_deref(), Some("{\"a\": 1}"));
/// ```
#[must_use]
pub fn extract_json(text: &str) -> Option<String> {
    let cleaned = strip_code_fences(text);
    balanced_object(&cleaned).map(str::to_owned)
}

fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_owned()
}

fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (offset, ch) in text[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

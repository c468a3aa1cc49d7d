//! Token accounting and AI call logging.

use uuid::Uuid;

use crate::clock::Clock;
use crate::model::{AiAction, AiLogEntry};
use crate::repository::{AiLogRepository, ProjectRepository};

/// One completed LLM call, as seen by the component that made it.
#[derive(Debug, Clone)]
pub struct Usage<'a> {
    /// User the call was made for.
    pub owner_id: Uuid,
    /// Project the call was made for.
    pub project_id: Uuid,
    /// Purpose of the call.
    pub action: AiAction,
    /// Prompt text sent.
    pub prompt: &'a str,
    /// Response text received.
    pub response: &'a str,
    /// Tokens reported by the upstream.
    pub tokens: u64,
}

/// Adds the call's tokens to the project counter and appends an AI log
/// entry.
///
/// Accounting failures are logged and swallowed: the generated text is
/// already paid for and must still reach the caller.
pub async fn record_usage(
    projects: &dyn ProjectRepository,
    ai_logs: &dyn AiLogRepository,
    clock: &dyn Clock,
    usage: Usage<'_>,
) {
    let tokens = i64::try_from(usage.tokens).unwrap_or(i64::MAX);

    if let Err(e) = projects.add_tokens(usage.project_id, tokens).await {
        tracing::warn!(project_id = %usage.project_id, error = %e, "failed to add tokens");
    }

    let entry = AiLogEntry {
        id: Uuid::now_v7(),
        owner_id: usage.owner_id,
        project_id: usage.project_id,
        action: usage.action,
        prompt: usage.prompt.to_owned(),
        response: usage.response.to_owned(),
        tokens,
        created_at: clock.now(),
    };
    if let Err(e) = ai_logs.append(&entry).await {
        tracing::warn!(project_id = %usage.project_id, error = %e, "failed to append ai log");
    }
}

//! Conversation Provider Port - the language-model black box.
//!
//! One call per free-text turn: context in, reply text plus optional
//! structured field deltas out. The orchestrator never trusts the deltas;
//! they go through the same validator path as direct user input.

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::profile::{FieldDelta, Stage, TranscriptEntry};

/// Everything the provider may use to produce a reply.
#[derive(Debug, Clone)]
pub struct ConverseContext {
    /// Current conversation stage, so the provider knows what is being asked.
    pub stage: Stage,
    /// Display name for personalization, when known.
    pub name: Option<String>,
    /// Conversation so far, oldest first.
    pub transcript: Vec<TranscriptEntry>,
    /// The user's message this turn.
    pub message: String,
    /// Fields still missing, by schema name, to focus extraction.
    pub missing_fields: Vec<String>,
    /// Snapshot of the values captured so far, by schema name, so the
    /// provider can phrase follow-ups around what was already answered.
    pub captured: BTreeMap<String, String>,
}

/// Provider reply: text plus opportunistically extracted data.
#[derive(Debug, Clone, Default)]
pub struct ConverseOutcome {
    /// Reply text, used verbatim unless the orchestrator overrides it.
    pub reply: String,
    /// Structured data the model extracted from the exchange.
    pub field_deltas: Vec<FieldDelta>,
    /// Provider judged the answer too thin to move on.
    pub needs_follow_up: bool,
}

impl ConverseOutcome {
    /// A plain text reply with no extracted data.
    pub fn reply(text: impl Into<String>) -> Self {
        Self {
            reply: text.into(),
            ..Default::default()
        }
    }
}

/// Provider failures. All map to a user-facing retry message; none advance
/// the conversation stage.
#[derive(Debug, Error)]
pub enum ConverseError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to parse provider response: {0}")]
    Parse(String),

    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u32 },
}

impl ConverseError {
    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ConverseError::Unavailable(_)
                | ConverseError::RateLimited { .. }
                | ConverseError::Network(_)
                | ConverseError::Timeout { .. }
        )
    }
}

/// Port for the LLM conversation call.
#[async_trait]
pub trait ConversationProvider: Send + Sync {
    /// Produces the reply and any extracted field deltas for one turn.
    async fn converse(&self, context: ConverseContext) -> Result<ConverseOutcome, ConverseError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_reply_constructor_is_plain() {
        let outcome = ConverseOutcome::reply("hello");
        assert_eq!(outcome.reply, "hello");
        assert!(outcome.field_deltas.is_empty());
        assert!(!outcome.needs_follow_up);
    }

    #[test]
    fn retryable_classification() {
        assert!(ConverseError::Network("reset".into()).is_retryable());
        assert!(ConverseError::RateLimited { retry_after_secs: 5 }.is_retryable());
        assert!(ConverseError::Timeout { timeout_secs: 30 }.is_retryable());
        assert!(!ConverseError::AuthenticationFailed.is_retryable());
        assert!(!ConverseError::Parse("bad json".into()).is_retryable());
    }
}

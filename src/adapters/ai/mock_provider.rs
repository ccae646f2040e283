//! Mock Conversation Provider for testing.
//!
//! Configurable implementation of the ConversationProvider port so tests
//! can run the full turn pipeline without calling a real model.
//!
//! # Features
//!
//! - Pre-configured outcomes, consumed in order
//! - Simulated delays for timeout testing
//! - Error injection for resilience testing
//! - Call tracking for verification

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{ConversationProvider, ConverseContext, ConverseError, ConverseOutcome};

/// A configured mock turn.
#[derive(Debug, Clone)]
enum MockTurn {
    Outcome(ConverseOutcome),
    Error(MockConverseError),
}

/// Cloneable stand-ins for the port's error variants.
#[derive(Debug, Clone)]
pub enum MockConverseError {
    Unavailable { message: String },
    AuthenticationFailed,
    RateLimited { retry_after_secs: u32 },
    Network { message: String },
    Parse { message: String },
    Timeout { timeout_secs: u32 },
}

impl From<MockConverseError> for ConverseError {
    fn from(err: MockConverseError) -> Self {
        match err {
            MockConverseError::Unavailable { message } => ConverseError::Unavailable(message),
            MockConverseError::AuthenticationFailed => ConverseError::AuthenticationFailed,
            MockConverseError::RateLimited { retry_after_secs } => {
                ConverseError::RateLimited { retry_after_secs }
            }
            MockConverseError::Network { message } => ConverseError::Network(message),
            MockConverseError::Parse { message } => ConverseError::Parse(message),
            MockConverseError::Timeout { timeout_secs } => ConverseError::Timeout { timeout_secs },
        }
    }
}

/// Mock conversation provider for testing.
#[derive(Debug, Clone, Default)]
pub struct MockConversationProvider {
    /// Pre-configured turns (consumed in order).
    turns: Arc<Mutex<VecDeque<MockTurn>>>,
    /// Simulated latency per request.
    delay: Duration,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<ConverseContext>>>,
}

impl MockConversationProvider {
    /// Creates a new mock provider with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a plain text reply with no extracted data.
    pub fn with_reply(self, text: impl Into<String>) -> Self {
        self.with_outcome(ConverseOutcome::reply(text))
    }

    /// Queues a fully configured outcome.
    pub fn with_outcome(self, outcome: ConverseOutcome) -> Self {
        self.turns
            .lock()
            .unwrap()
            .push_back(MockTurn::Outcome(outcome));
        self
    }

    /// Queues an error.
    pub fn with_error(self, error: MockConverseError) -> Self {
        self.turns.lock().unwrap().push_back(MockTurn::Error(error));
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns the number of calls made to this provider.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Returns all recorded calls.
    pub fn get_calls(&self) -> Vec<ConverseContext> {
        self.calls.lock().unwrap().clone()
    }

    /// Gets the next configured turn or a default reply.
    fn next_turn(&self) -> MockTurn {
        self.turns
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| MockTurn::Outcome(ConverseOutcome::reply("Mock reply")))
    }
}

#[async_trait]
impl ConversationProvider for MockConversationProvider {
    async fn converse(&self, context: ConverseContext) -> Result<ConverseOutcome, ConverseError> {
        self.calls.lock().unwrap().push(context);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_turn() {
            MockTurn::Outcome(outcome) => Ok(outcome),
            MockTurn::Error(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::{FieldDelta, FieldId, Stage};

    fn context(message: &str) -> ConverseContext {
        ConverseContext {
            stage: Stage::AwaitingGoals,
            name: None,
            transcript: Vec::new(),
            message: message.to_string(),
            missing_fields: vec!["career_goals".to_string()],
            captured: std::collections::BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn returns_configured_outcomes_in_order() {
        let provider = MockConversationProvider::new()
            .with_reply("First")
            .with_outcome(ConverseOutcome {
                reply: "Second".to_string(),
                field_deltas: vec![FieldDelta::new(FieldId::CareerGoals, "lead a team")],
                needs_follow_up: true,
            });

        let r1 = provider.converse(context("hi")).await.unwrap();
        let r2 = provider.converse(context("goals")).await.unwrap();

        assert_eq!(r1.reply, "First");
        assert_eq!(r2.reply, "Second");
        assert_eq!(r2.field_deltas.len(), 1);
        assert!(r2.needs_follow_up);
    }

    #[tokio::test]
    async fn returns_default_after_exhausted() {
        let provider = MockConversationProvider::new().with_reply("Only one");

        provider.converse(context("a")).await.unwrap();
        let r2 = provider.converse(context("b")).await.unwrap();
        assert_eq!(r2.reply, "Mock reply");
    }

    #[tokio::test]
    async fn returns_configured_error() {
        let provider = MockConversationProvider::new().with_error(MockConverseError::RateLimited {
            retry_after_secs: 30,
        });

        let err = provider.converse(context("hi")).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(err, ConverseError::RateLimited { retry_after_secs: 30 }));
    }

    #[tokio::test]
    async fn tracks_calls() {
        let provider = MockConversationProvider::new();
        assert_eq!(provider.call_count(), 0);

        provider.converse(context("one")).await.unwrap();
        provider.converse(context("two")).await.unwrap();

        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.get_calls()[1].message, "two");
    }

    #[tokio::test]
    async fn respects_delay() {
        let provider = MockConversationProvider::new()
            .with_reply("slow")
            .with_delay(Duration::from_millis(50));

        let start = std::time::Instant::now();
        provider.converse(context("hi")).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}

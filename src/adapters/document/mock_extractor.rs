//! Mock Resume Extractor for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::ports::{ExtractError, ResumeExtractor};

/// A configured extraction result.
#[derive(Debug, Clone)]
enum MockExtraction {
    Text(String),
    Unreadable(String),
    Empty,
}

/// Scripted extractor: returns queued results in order, then a default.
#[derive(Debug, Clone, Default)]
pub struct MockResumeExtractor {
    results: Arc<Mutex<VecDeque<MockExtraction>>>,
    calls: Arc<Mutex<usize>>,
}

impl MockResumeExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues successfully extracted text.
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.results
            .lock()
            .unwrap()
            .push_back(MockExtraction::Text(text.into()));
        self
    }

    /// Queues an unreadable-document failure.
    pub fn with_unreadable(self, reason: impl Into<String>) -> Self {
        self.results
            .lock()
            .unwrap()
            .push_back(MockExtraction::Unreadable(reason.into()));
        self
    }

    /// Queues an empty-document failure.
    pub fn with_empty(self) -> Self {
        self.results.lock().unwrap().push_back(MockExtraction::Empty);
        self
    }

    /// Number of extraction calls made.
    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl ResumeExtractor for MockResumeExtractor {
    async fn extract_text(&self, _bytes: &[u8]) -> Result<String, ExtractError> {
        *self.calls.lock().unwrap() += 1;

        match self.results.lock().unwrap().pop_front() {
            Some(MockExtraction::Text(text)) => Ok(text),
            Some(MockExtraction::Unreadable(reason)) => Err(ExtractError::Unreadable(reason)),
            Some(MockExtraction::Empty) => Err(ExtractError::Empty),
            None => Ok("Mock resume text".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_queued_results_then_default() {
        let extractor = MockResumeExtractor::new()
            .with_text("Jo Example\njo@example.com")
            .with_unreadable("encrypted");

        assert_eq!(
            extractor.extract_text(b"pdf").await.unwrap(),
            "Jo Example\njo@example.com"
        );
        assert!(matches!(
            extractor.extract_text(b"pdf").await,
            Err(ExtractError::Unreadable(_))
        ));
        assert_eq!(extractor.extract_text(b"pdf").await.unwrap(), "Mock resume text");
        assert_eq!(extractor.call_count(), 3);
    }
}

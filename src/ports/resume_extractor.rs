//! Resume Extractor Port - the document-to-text black box.

use async_trait::async_trait;
use thiserror::Error;

/// Extraction failures. The turn that hit one keeps its stage and profile
/// untouched; the user is asked to retry.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("document could not be parsed: {0}")]
    Unreadable(String),

    #[error("document contained no extractable text")]
    Empty,

    #[error("extraction timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u32 },
}

/// Port for turning uploaded document bytes into plain text.
#[async_trait]
pub trait ResumeExtractor: Send + Sync {
    /// Extracts plain text from the document bytes.
    async fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractError>;
}

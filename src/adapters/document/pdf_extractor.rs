//! PDF Resume Extractor - text extraction from uploaded PDF bytes.
//!
//! `pdf_extract` is synchronous and CPU-bound, so extraction runs on the
//! blocking thread pool rather than the async runtime.

use async_trait::async_trait;

use crate::ports::{ExtractError, ResumeExtractor};

/// Extracts plain text from PDF bytes via `pdf_extract`.
#[derive(Debug, Clone, Default)]
pub struct PdfResumeExtractor;

impl PdfResumeExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ResumeExtractor for PdfResumeExtractor {
    async fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        let bytes = bytes.to_vec();

        let text = tokio::task::spawn_blocking(move || {
            pdf_extract::extract_text_from_mem(&bytes)
        })
        .await
        .map_err(|e| ExtractError::Unreadable(format!("extraction task failed: {}", e)))?
        .map_err(|e| ExtractError::Unreadable(e.to_string()))?;

        if text.trim().is_empty() {
            return Err(ExtractError::Empty);
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn garbage_bytes_are_unreadable() {
        let extractor = PdfResumeExtractor::new();
        let result = extractor.extract_text(b"definitely not a pdf").await;
        assert!(matches!(result, Err(ExtractError::Unreadable(_))));
    }
}

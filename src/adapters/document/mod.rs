//! Document adapters - ResumeExtractor implementations.

mod mock_extractor;
mod pdf_extractor;

pub use mock_extractor::MockResumeExtractor;
pub use pdf_extractor::PdfResumeExtractor;

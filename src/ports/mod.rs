//! Ports - interfaces the orchestration core depends on.
//!
//! Adapters implement these traits; the domain and application layers only
//! ever see the trait objects.

mod conversation;
mod profile_store;
mod resume_extractor;

pub use conversation::{
    ConversationProvider, ConverseContext, ConverseError, ConverseOutcome,
};
pub use profile_store::{ProfileStore, StoreError};
pub use resume_extractor::{ExtractError, ResumeExtractor};

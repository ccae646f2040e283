//! Profile Store Port - durable per-user state.
//!
//! Narrow contract over the black-box key/value + append-log store: one
//! profile and one transcript per user id. The orchestrator persists each
//! turn through `save_turn` so implementations can make the profile write
//! and the transcript append a single unit (no partial persistence).

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::UserId;
use crate::domain::profile::{Profile, TranscriptEntry};

/// Storage failures. Not recoverable locally; the orchestrator propagates
/// them as server errors and discards the turn's in-memory mutations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O failed: {0}")]
    Io(String),

    #[error("stored state is corrupt for user {user_id}: {reason}")]
    Corrupt { user_id: String, reason: String },
}

impl StoreError {
    pub fn io(message: impl Into<String>) -> Self {
        StoreError::Io(message.into())
    }

    pub fn corrupt(user_id: &UserId, reason: impl Into<String>) -> Self {
        StoreError::Corrupt {
            user_id: user_id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Port for profile and transcript persistence.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Loads the profile for a user, `None` when the user is new.
    async fn load_profile(&self, user_id: &UserId) -> Result<Option<Profile>, StoreError>;

    /// Loads the full transcript for a user (empty for a new user).
    async fn load_transcript(&self, user_id: &UserId) -> Result<Vec<TranscriptEntry>, StoreError>;

    /// Persists one turn: the profile snapshot plus the turn's new
    /// transcript entries.
    ///
    /// Each write is all-or-nothing, and implementations commit the profile
    /// only after the transcript: an interrupted turn may leave surplus
    /// transcript entries, but never a profile ahead of its transcript.
    async fn save_turn(
        &self,
        profile: &Profile,
        entries: &[TranscriptEntry],
    ) -> Result<(), StoreError>;
}

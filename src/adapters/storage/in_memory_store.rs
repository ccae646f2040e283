//! In-Memory Profile Store Adapter
//!
//! Keeps profiles and transcripts in process memory.
//! Useful for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::UserId;
use crate::domain::profile::{Profile, TranscriptEntry};
use crate::ports::{ProfileStore, StoreError};

/// In-memory storage for profiles and transcripts.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProfileStore {
    profiles: Arc<RwLock<HashMap<UserId, Profile>>>,
    transcripts: Arc<RwLock<HashMap<UserId, Vec<TranscriptEntry>>>>,
}

impl InMemoryProfileStore {
    /// Create a new in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored data (useful for tests).
    pub async fn clear(&self) {
        self.profiles.write().await.clear();
        self.transcripts.write().await.clear();
    }

    /// Number of stored profiles.
    pub async fn profile_count(&self) -> usize {
        self.profiles.read().await.len()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn load_profile(&self, user_id: &UserId) -> Result<Option<Profile>, StoreError> {
        let profiles = self.profiles.read().await;
        Ok(profiles.get(user_id).cloned())
    }

    async fn load_transcript(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<TranscriptEntry>, StoreError> {
        let transcripts = self.transcripts.read().await;
        Ok(transcripts.get(user_id).cloned().unwrap_or_default())
    }

    async fn save_turn(
        &self,
        profile: &Profile,
        entries: &[TranscriptEntry],
    ) -> Result<(), StoreError> {
        // Profile write and transcript append happen under both write
        // guards, so a concurrent reader never sees half a turn.
        let mut profiles = self.profiles.write().await;
        let mut transcripts = self.transcripts.write().await;

        profiles.insert(profile.user_id.clone(), profile.clone());
        transcripts
            .entry(profile.user_id.clone())
            .or_default()
            .extend_from_slice(entries);
        Ok(())
    }
}

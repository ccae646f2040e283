//! File-Backed Profile Store Adapter
//!
//! Persists each user's profile and transcript as JSON files under a data
//! directory. Writes go through a temp file and rename, so a crash mid-write
//! never leaves a torn file on disk. Both of a turn's payloads are staged
//! before either rename runs, and the profile commits last: an interrupted
//! turn can leave surplus transcript entries, but never a new profile
//! without the transcript that produced it.

use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::foundation::UserId;
use crate::domain::profile::{Profile, TranscriptEntry};
use crate::ports::{ProfileStore, StoreError};

/// JSON-file storage for profiles and transcripts.
#[derive(Debug, Clone)]
pub struct FileProfileStore {
    data_dir: PathBuf,
}

impl FileProfileStore {
    /// Creates a store rooted at the given directory (created on demand).
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Filesystem-safe key for a client-supplied user id.
    ///
    /// User ids are opaque client strings, so they are never used directly
    /// as file names; a readable prefix plus a hash keeps keys unique.
    fn file_key(user_id: &UserId) -> String {
        let mut hasher = DefaultHasher::new();
        user_id.as_str().hash(&mut hasher);
        let prefix: String = user_id
            .as_str()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .take(40)
            .collect();
        format!("{}-{:016x}", prefix, hasher.finish())
    }

    fn profile_path(&self, user_id: &UserId) -> PathBuf {
        self.data_dir
            .join(format!("{}.profile.json", Self::file_key(user_id)))
    }

    fn transcript_path(&self, user_id: &UserId) -> PathBuf {
        self.data_dir
            .join(format!("{}.transcript.json", Self::file_key(user_id)))
    }

    /// Writes the payload to a staging file next to its final path.
    async fn stage(path: &Path, bytes: &[u8]) -> Result<PathBuf, StoreError> {
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes)
            .await
            .map_err(|e| StoreError::io(e.to_string()))?;
        Ok(tmp)
    }

    /// Moves a staged file onto its final path.
    async fn commit(tmp: &Path, path: &Path) -> Result<(), StoreError> {
        fs::rename(tmp, path)
            .await
            .map_err(|e| StoreError::io(e.to_string()))
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &Path,
        user_id: &UserId,
    ) -> Result<Option<T>, StoreError> {
        match fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| StoreError::corrupt(user_id, e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(e.to_string())),
        }
    }
}

#[async_trait]
impl ProfileStore for FileProfileStore {
    async fn load_profile(&self, user_id: &UserId) -> Result<Option<Profile>, StoreError> {
        self.read_json(&self.profile_path(user_id), user_id).await
    }

    async fn load_transcript(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<TranscriptEntry>, StoreError> {
        Ok(self
            .read_json(&self.transcript_path(user_id), user_id)
            .await?
            .unwrap_or_default())
    }

    async fn save_turn(
        &self,
        profile: &Profile,
        entries: &[TranscriptEntry],
    ) -> Result<(), StoreError> {
        let mut transcript = self.load_transcript(&profile.user_id).await?;
        transcript.extend_from_slice(entries);

        let profile_bytes = serde_json::to_vec_pretty(profile)
            .map_err(|e| StoreError::io(e.to_string()))?;
        let transcript_bytes = serde_json::to_vec_pretty(&transcript)
            .map_err(|e| StoreError::io(e.to_string()))?;

        fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| StoreError::io(e.to_string()))?;

        let profile_path = self.profile_path(&profile.user_id);
        let transcript_path = self.transcript_path(&profile.user_id);

        // Stage both payloads before committing either; the profile commit
        // goes last so a stored profile never gets ahead of its transcript.
        let profile_tmp = Self::stage(&profile_path, &profile_bytes).await?;
        let transcript_tmp = Self::stage(&transcript_path, &transcript_bytes).await?;
        Self::commit(&transcript_tmp, &transcript_path).await?;
        Self::commit(&profile_tmp, &profile_path).await
    }
}

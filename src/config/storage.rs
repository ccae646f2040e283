//! Storage and upload configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Profile storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Which ProfileStore to wire up
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,

    /// Data directory for the file backend
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

/// Profile storage backend type
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process memory only; state is lost on restart.
    Memory,
    #[default]
    File,
}

impl StorageConfig {
    /// Validate storage configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.backend == StorageBackend::File && self.data_dir.trim().is_empty() {
            return Err(ValidationError::MissingDataDir);
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_backend() -> StorageBackend {
    StorageBackend::File
}

fn default_data_dir() -> String {
    "./data".to_string()
}

/// Resume upload limits
#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Maximum accepted file size in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: usize,
}

impl UploadConfig {
    /// Validate upload configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_bytes < 1024 || self.max_bytes > 50 * 1024 * 1024 {
            return Err(ValidationError::InvalidUploadLimit);
        }
        Ok(())
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

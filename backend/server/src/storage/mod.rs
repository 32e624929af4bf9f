//! # Storage
//!
//! Swappable persistence behind [`FeedbackStore`].
//!
//! ## Backends
//!
//! - [`memory`]: process lifetime lists, gone on restart
//! - [`file`]: JSON files on the local filesystem, persists until deleted
//! - [`blob`]: one JSON blob in object storage, persists until removed remotely
//!
//! ## Contract
//!
//! - Page filtering is plain equality on `page`
//! - Unknown ids are `Ok(None)` / `Ok(false)`, never an error
//! - General feedback is optional, backends without it answer [`StorageError::Unsupported`]
//! - No locking, every write is read-modify-write and the last writer wins
use std::sync::Arc;

use async_trait::async_trait;
use feedback::{FeedbackPatch, FeedbackPoint, FeedbackRound, GeneralFeedback};
use thiserror::Error;
use tracing::info;

use crate::config::{Config, StorageKind};

pub mod blob;
pub mod file;
pub mod memory;

pub use blob::{BlobStorage, BlobStore, HttpBlobStore};
pub use file::FileStorage;
pub use memory::MemoryStorage;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Blob request failed: {0}")]
    Blob(#[from] reqwest::Error),

    #[error("Blob store responded with status {0}")]
    BlobStatus(u16),

    #[error("Operation not supported by this storage backend")]
    Unsupported,
}

#[async_trait]
pub trait FeedbackStore: Send + Sync {
    async fn get_feedback(&self, page: Option<&str>) -> Result<Vec<FeedbackPoint>, StorageError>;

    async fn save_feedback(&self, point: FeedbackPoint) -> Result<FeedbackPoint, StorageError>;

    async fn update_feedback(
        &self,
        id: &str,
        patch: FeedbackPatch,
    ) -> Result<Option<FeedbackPoint>, StorageError>;

    async fn delete_feedback(&self, id: &str) -> Result<bool, StorageError>;

    async fn get_rounds(&self, page: Option<&str>) -> Result<Vec<FeedbackRound>, StorageError>;

    async fn get_general_feedback(
        &self,
        _page: Option<&str>,
    ) -> Result<Vec<GeneralFeedback>, StorageError> {
        Err(StorageError::Unsupported)
    }

    async fn save_general_feedback(
        &self,
        _feedback: GeneralFeedback,
    ) -> Result<GeneralFeedback, StorageError> {
        Err(StorageError::Unsupported)
    }

    async fn delete_general_feedback(&self, _id: &str) -> Result<bool, StorageError> {
        Err(StorageError::Unsupported)
    }
}

pub fn from_config(config: &Config) -> anyhow::Result<Arc<dyn FeedbackStore>> {
    let storage: Arc<dyn FeedbackStore> = match config.storage {
        StorageKind::Memory => {
            info!("Using in-memory storage, feedback is lost on restart");
            Arc::new(MemoryStorage::new())
        }
        StorageKind::File => {
            info!(
                "Using file storage at {} and {}",
                config.feedback_dir.display(),
                config.rounds_dir.display()
            );
            Arc::new(FileStorage::new(&config.feedback_dir, &config.rounds_dir))
        }
        StorageKind::Blob => {
            let blob = config
                .blob
                .as_ref()
                .ok_or_else(|| anyhow::anyhow!("Blob storage selected without blob config"))?;

            info!("Using blob storage at {}", blob.api_url);
            let store = HttpBlobStore::new(&blob.api_url, &blob.token);
            Arc::new(BlobStorage::new(
                store,
                &blob.feedback_prefix,
                &blob.rounds_prefix,
            ))
        }
    };

    Ok(storage)
}

/// Index of the first record with a matching id.
pub(crate) fn position_of<T>(items: &[T], id: &str, id_of: impl Fn(&T) -> &str) -> Option<usize> {
    items.iter().position(|item| id_of(item) == id)
}

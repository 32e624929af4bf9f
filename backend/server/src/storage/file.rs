//! # File Storage
//!
//! Local JSON files. Not usable on read-only or ephemeral filesystems.
//!
//! ## Layout
//!
//! - `feedback_dir/feedback.json`: every point, pretty printed
//! - `feedback_dir/general.json`: general feedback, newest first
//! - `rounds_dir/*.json`: one round per file, written by hand or by `pinpoint-cli archive`
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use feedback::{
    FeedbackPatch, FeedbackPoint, FeedbackRound, GeneralFeedback, filter_page, filter_rounds,
    utils::sort_newest_first,
};
use serde::{Serialize, de::DeserializeOwned};
use tokio::fs;
use tracing::{error, warn};

use super::{FeedbackStore, StorageError, position_of};

const FEEDBACK_FILE: &str = "feedback.json";
const GENERAL_FILE: &str = "general.json";

pub struct FileStorage {
    feedback_dir: PathBuf,
    rounds_dir: PathBuf,
}

impl FileStorage {
    pub fn new(feedback_dir: impl AsRef<Path>, rounds_dir: impl AsRef<Path>) -> Self {
        Self {
            feedback_dir: feedback_dir.as_ref().to_path_buf(),
            rounds_dir: rounds_dir.as_ref().to_path_buf(),
        }
    }

    fn feedback_file(&self) -> PathBuf {
        self.feedback_dir.join(FEEDBACK_FILE)
    }

    fn general_file(&self) -> PathBuf {
        self.feedback_dir.join(GENERAL_FILE)
    }

    async fn read_list<T: DeserializeOwned>(&self, path: &Path) -> Result<Vec<T>, StorageError> {
        fs::create_dir_all(&self.feedback_dir).await?;

        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str(&content) {
            Ok(items) => Ok(items),
            Err(e) => {
                warn!("Ignoring unreadable {}: {e}", path.display());
                Ok(Vec::new())
            }
        }
    }

    async fn write_list<T: Serialize>(&self, path: &Path, items: &[T]) -> Result<(), StorageError> {
        fs::create_dir_all(&self.feedback_dir).await?;
        fs::write(path, serde_json::to_string_pretty(items)?).await?;

        Ok(())
    }

    async fn read_rounds(&self) -> Result<Vec<FeedbackRound>, StorageError> {
        fs::create_dir_all(&self.rounds_dir).await?;

        let mut entries = fs::read_dir(&self.rounds_dir).await?;
        let mut rounds: Vec<FeedbackRound> = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }

            let parsed = fs::read_to_string(&path)
                .await
                .map_err(StorageError::from)
                .and_then(|content| serde_json::from_str(&content).map_err(StorageError::from));

            match parsed {
                Ok(round) => rounds.push(round),
                Err(e) => error!("Failed to parse round {}: {e}", path.display()),
            }
        }

        sort_newest_first(&mut rounds);
        Ok(rounds)
    }
}

#[async_trait]
impl FeedbackStore for FileStorage {
    async fn get_feedback(&self, page: Option<&str>) -> Result<Vec<FeedbackPoint>, StorageError> {
        let all = self.read_list(&self.feedback_file()).await?;
        Ok(filter_page(all, page))
    }

    async fn save_feedback(&self, point: FeedbackPoint) -> Result<FeedbackPoint, StorageError> {
        let path = self.feedback_file();
        let mut all: Vec<FeedbackPoint> = self.read_list(&path).await?;

        all.push(point.clone());
        self.write_list(&path, &all).await?;

        Ok(point)
    }

    async fn update_feedback(
        &self,
        id: &str,
        patch: FeedbackPatch,
    ) -> Result<Option<FeedbackPoint>, StorageError> {
        let path = self.feedback_file();
        let mut all: Vec<FeedbackPoint> = self.read_list(&path).await?;

        let Some(index) = position_of(&all, id, |p| p.id.as_str()) else {
            return Ok(None);
        };

        patch.apply(&mut all[index]);
        self.write_list(&path, &all).await?;

        Ok(Some(all.swap_remove(index)))
    }

    async fn delete_feedback(&self, id: &str) -> Result<bool, StorageError> {
        let path = self.feedback_file();
        let mut all: Vec<FeedbackPoint> = self.read_list(&path).await?;

        let Some(index) = position_of(&all, id, |p| p.id.as_str()) else {
            return Ok(false);
        };

        all.remove(index);
        self.write_list(&path, &all).await?;

        Ok(true)
    }

    async fn get_rounds(&self, page: Option<&str>) -> Result<Vec<FeedbackRound>, StorageError> {
        let rounds = self.read_rounds().await?;
        Ok(filter_rounds(rounds, page))
    }

    async fn get_general_feedback(
        &self,
        page: Option<&str>,
    ) -> Result<Vec<GeneralFeedback>, StorageError> {
        let all = self.read_list(&self.general_file()).await?;
        Ok(filter_page(all, page))
    }

    async fn save_general_feedback(
        &self,
        feedback: GeneralFeedback,
    ) -> Result<GeneralFeedback, StorageError> {
        let path = self.general_file();
        let mut all: Vec<GeneralFeedback> = self.read_list(&path).await?;

        all.insert(0, feedback.clone());
        self.write_list(&path, &all).await?;

        Ok(feedback)
    }

    async fn delete_general_feedback(&self, id: &str) -> Result<bool, StorageError> {
        let path = self.general_file();
        let mut all: Vec<GeneralFeedback> = self.read_list(&path).await?;

        let Some(index) = position_of(&all, id, |f| f.id.as_str()) else {
            return Ok(false);
        };

        all.remove(index);
        self.write_list(&path, &all).await?;

        Ok(true)
    }
}
